use crate::error::{StoreError, StoreResult};
use crate::models::{Client, Dataset, Enrollment, NewClient, NewEnrollment, NewProgram, Program};
use crate::validation::{validate_new_client, validate_new_program, ValidationError};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// What to do when a client is enrolled in a program twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep one enrollment per (client, program) pair
    #[default]
    Reject,
    /// Re-enrollment creates another row
    Allow,
}

impl NewClient {
    /// Import deduplication key (NOT identity: two real people can share it
    /// only if they share a name and a phone number)
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}",
            self.first_name.trim().to_lowercase(),
            self.last_name.trim().to_lowercase(),
            self.phone_number.trim()
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Event for audit trail: every create is recorded
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> StoreResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            age INTEGER NOT NULL CHECK (age >= 0),
            phone_number TEXT NOT NULL,
            area_of_residence TEXT NOT NULL,
            profession TEXT,
            import_hash TEXT UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS programs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            short_code TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL REFERENCES clients(id),
            program_id INTEGER NOT NULL REFERENCES programs(id),
            enrollment_id TEXT UNIQUE NOT NULL,
            enrolled_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(last_name, first_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_pair ON enrollments(client_id, program_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ============================================================================
// CLIENTS
// ============================================================================

const CLIENT_COLUMNS: &str = "id, first_name, last_name, age, phone_number, area_of_residence,
                              profession, created_at, updated_at";

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    let profession: Option<String> = row.get(6)?;
    Ok(Client {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        age: row.get(3)?,
        phone_number: row.get(4)?,
        area_of_residence: row.get(5)?,
        profession: profession.filter(|p| !p.is_empty()),
        created_at: parse_timestamp(row.get(7)?),
        updated_at: parse_timestamp(row.get(8)?),
    })
}

fn write_client(conn: &Connection, client: &NewClient, import_hash: Option<&str>, actor: &str) -> StoreResult<Client> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO clients (
            first_name, last_name, age, phone_number, area_of_residence,
            profession, import_hash, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            client.first_name.trim(),
            client.last_name.trim(),
            client.age,
            client.phone_number.trim(),
            client.area_of_residence,
            client.profession,
            import_hash,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    let event = Event::new(
        "client_created",
        "client",
        &id.to_string(),
        serde_json::json!({
            "area_of_residence": client.area_of_residence,
            "age": client.age,
        }),
        actor,
    );
    insert_event(conn, &event)?;

    get_client(conn, id)?.ok_or(StoreError::NotFound { entity: "client", id })
}

/// Validate and insert a new client
pub fn insert_client(conn: &Connection, client: &NewClient) -> StoreResult<Client> {
    validate_new_client(client).map_err(StoreError::Validation)?;

    // Record and audit event commit together
    let tx = conn.unchecked_transaction()?;
    let created = write_client(&tx, client, None, "staff")?;
    tx.commit()?;

    tracing::info!(client_id = created.id, "client registered");
    Ok(created)
}

pub fn get_client(conn: &Connection, id: i64) -> StoreResult<Option<Client>> {
    let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
    let client = conn
        .query_row(&sql, params![id], client_from_row)
        .optional()?;
    Ok(client)
}

/// All clients ordered by last name, then first name
pub fn get_all_clients(conn: &Connection) -> StoreResult<Vec<Client>> {
    let sql = format!(
        "SELECT {} FROM clients ORDER BY last_name, first_name, id",
        CLIENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let clients = stmt
        .query_map([], client_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(clients)
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Case-insensitive substring search over names and phone number.
/// A blank query lists everyone.
pub fn search_clients(conn: &Connection, query: &str) -> StoreResult<Vec<Client>> {
    if query.trim().is_empty() {
        return get_all_clients(conn);
    }

    let sql = format!(
        "SELECT {} FROM clients
         WHERE lower(first_name) LIKE ?1 ESCAPE '\\'
            OR lower(last_name) LIKE ?1 ESCAPE '\\'
            OR lower(first_name || ' ' || last_name) LIKE ?1 ESCAPE '\\'
            OR phone_number LIKE ?1 ESCAPE '\\'
         ORDER BY last_name, first_name, id",
        CLIENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let clients = stmt
        .query_map(params![like_pattern(query)], client_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(query, matches = clients.len(), "client search");
    Ok(clients)
}

// ============================================================================
// PROGRAMS
// ============================================================================

fn program_from_row(row: &Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        short_code: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_timestamp(row.get(4)?),
        updated_at: parse_timestamp(row.get(5)?),
    })
}

/// Validate and insert a program; name and short code must be unique
pub fn insert_program(conn: &Connection, program: &NewProgram) -> StoreResult<Program> {
    let tx = conn.unchecked_transaction()?;
    let created = write_program(&tx, program)?;
    tx.commit()?;

    tracing::info!(program_id = created.id, short_code = %created.short_code, "program created");
    Ok(created)
}

fn write_program(conn: &Connection, program: &NewProgram) -> StoreResult<Program> {
    validate_new_program(program).map_err(StoreError::Validation)?;
    let now = Utc::now().to_rfc3339();

    let result = conn.execute(
        "INSERT INTO programs (name, short_code, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![program.name.trim(), program.short_code, program.description, now],
    );

    match result {
        Ok(_) => {}
        Err(ref e) if is_constraint_violation(e) => {
            return Err(StoreError::Validation(vec![ValidationError::new(
                "Program",
                "name",
                "A program with this name or short code already exists",
            )]));
        }
        Err(e) => return Err(e.into()),
    }

    let id = conn.last_insert_rowid();
    insert_event(
        conn,
        &Event::new(
            "program_created",
            "program",
            &id.to_string(),
            serde_json::json!({ "short_code": program.short_code }),
            "staff",
        ),
    )?;

    get_program(conn, id)?.ok_or(StoreError::NotFound { entity: "program", id })
}

pub fn get_program(conn: &Connection, id: i64) -> StoreResult<Option<Program>> {
    let program = conn
        .query_row(
            "SELECT id, name, short_code, description, created_at, updated_at
             FROM programs WHERE id = ?1",
            params![id],
            program_from_row,
        )
        .optional()?;
    Ok(program)
}

pub fn get_all_programs(conn: &Connection) -> StoreResult<Vec<Program>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, short_code, description, created_at, updated_at
         FROM programs ORDER BY id",
    )?;
    let programs = stmt
        .query_map([], program_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(programs)
}

// ============================================================================
// ENROLLMENTS
// ============================================================================

const ENROLLMENT_SELECT: &str = "SELECT e.id, e.client_id, e.program_id, p.name, p.short_code,
                                        e.enrollment_id, e.enrolled_at
                                 FROM enrollments e
                                 LEFT JOIN programs p ON p.id = e.program_id";

fn enrollment_from_row(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    let program_name: Option<String> = row.get(3)?;
    let program_short_code: Option<String> = row.get(4)?;
    Ok(Enrollment {
        id: row.get(0)?,
        client_id: row.get(1)?,
        program_id: row.get(2)?,
        program_name: program_name.unwrap_or_default(),
        program_short_code: program_short_code.unwrap_or_default(),
        enrollment_id: row.get(5)?,
        enrolled_at: parse_timestamp(row.get(6)?),
    })
}

fn new_enrollment_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("ENR-{}", raw[..10].to_uppercase())
}

/// Enroll a client; both sides must exist
pub fn insert_enrollment(
    conn: &Connection,
    enrollment: &NewEnrollment,
    policy: DuplicatePolicy,
) -> StoreResult<Enrollment> {
    let tx = conn.unchecked_transaction()?;
    let created = write_enrollment(&tx, enrollment, policy)?;
    tx.commit()?;

    tracing::info!(
        client_id = enrollment.client_id,
        program_id = enrollment.program_id,
        enrollment_id = %created.enrollment_id,
        "client enrolled"
    );
    Ok(created)
}

fn write_enrollment(
    conn: &Connection,
    enrollment: &NewEnrollment,
    policy: DuplicatePolicy,
) -> StoreResult<Enrollment> {
    let NewEnrollment { client_id, program_id } = *enrollment;

    if get_client(conn, client_id)?.is_none() {
        return Err(StoreError::NotFound { entity: "client", id: client_id });
    }
    if get_program(conn, program_id)?.is_none() {
        return Err(StoreError::NotFound { entity: "program", id: program_id });
    }

    if policy == DuplicatePolicy::Reject {
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM enrollments WHERE client_id = ?1 AND program_id = ?2",
            params![client_id, program_id],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(StoreError::DuplicateEnrollment { client_id, program_id });
        }
    }

    let enrollment_id = new_enrollment_id();
    conn.execute(
        "INSERT INTO enrollments (client_id, program_id, enrollment_id, enrolled_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![client_id, program_id, enrollment_id, Utc::now().to_rfc3339()],
    )?;

    let id = conn.last_insert_rowid();
    insert_event(
        conn,
        &Event::new(
            "client_enrolled",
            "enrollment",
            &enrollment_id,
            serde_json::json!({ "client_id": client_id, "program_id": program_id }),
            "staff",
        ),
    )?;

    let sql = format!("{} WHERE e.id = ?1", ENROLLMENT_SELECT);
    let created = conn.query_row(&sql, params![id], enrollment_from_row)?;
    Ok(created)
}

pub fn get_all_enrollments(conn: &Connection) -> StoreResult<Vec<Enrollment>> {
    let sql = format!("{} ORDER BY e.id", ENROLLMENT_SELECT);
    let mut stmt = conn.prepare(&sql)?;
    let enrollments = stmt
        .query_map([], enrollment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(enrollments)
}

pub fn get_enrollments_for_client(conn: &Connection, client_id: i64) -> StoreResult<Vec<Enrollment>> {
    let sql = format!("{} WHERE e.client_id = ?1 ORDER BY e.id", ENROLLMENT_SELECT);
    let mut stmt = conn.prepare(&sql)?;
    let enrollments = stmt
        .query_map(params![client_id], enrollment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(enrollments)
}

/// Snapshot of every record, ready for analytics
pub fn load_dataset(conn: &Connection) -> StoreResult<Dataset> {
    Ok(Dataset::new(
        get_all_clients(conn)?,
        get_all_programs(conn)?,
        get_all_enrollments(conn)?,
    ))
}

/// Row counts per table: (clients, programs, enrollments)
pub fn verify_counts(conn: &Connection) -> StoreResult<(i64, i64, i64)> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
    };
    Ok((count("clients")?, count("programs")?, count("enrollments")?))
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> StoreResult<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Events for one entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> StoreResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let rows = stmt
        .query_map(params![entity_type, entity_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut events = Vec::with_capacity(rows.len());
    for (event_id, timestamp, event_type, entity_type, entity_id, data, actor) in rows {
        events.push(Event {
            event_id,
            timestamp: parse_timestamp(Some(timestamp)).unwrap_or_default(),
            event_type,
            entity_type,
            entity_id,
            data: serde_json::from_str(&data)?,
            actor,
        });
    }

    Ok(events)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    /// (1-based data line, reason)
    pub rejected: Vec<(usize, String)>,
}

/// A row that does not deserialize (e.g. a negative age) is rejected like an
/// invalid one; only I/O failures abort the import.
fn parsed_row<T>(
    result: Result<T, csv::Error>,
    line: usize,
    summary: &mut ImportSummary,
) -> StoreResult<Option<T>> {
    match result {
        Ok(row) => Ok(Some(row)),
        Err(e) if e.is_io_error() => Err(e.into()),
        Err(e) => {
            let reason = e.to_string();
            tracing::warn!(line, %reason, "unreadable csv row");
            summary.rejected.push((line, reason));
            Ok(None)
        }
    }
}

/// Import clients from a CSV with columns
/// `first_name,last_name,age,phone_number,area_of_residence,profession`.
///
/// Importing the same file twice inserts nothing the second time. Rows that
/// fail to parse or validate land in `rejected`; the file is imported in one
/// transaction, so an I/O or database failure leaves nothing behind.
pub fn import_clients_csv(conn: &Connection, csv_path: &Path) -> StoreResult<ImportSummary> {
    let mut rdr = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary::default();
    let tx = conn.unchecked_transaction()?;

    for (index, result) in rdr.deserialize::<NewClient>().enumerate() {
        let line = index + 1;
        let Some(client) = parsed_row(result, line, &mut summary)? else {
            continue;
        };

        if let Err(errors) = validate_new_client(&client) {
            let reason = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            tracing::warn!(line, %reason, "rejected client row");
            summary.rejected.push((line, reason));
            continue;
        }

        let hash = client.compute_idempotency_hash();
        match write_client(&tx, &client, Some(&hash), "csv_importer") {
            Ok(_) => summary.inserted += 1,
            Err(StoreError::Database(ref e)) if is_constraint_violation(e) => summary.duplicates += 1,
            Err(e) => return Err(e),
        }
    }
    tx.commit()?;

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected = summary.rejected.len(),
        path = %csv_path.display(),
        "client import finished"
    );
    Ok(summary)
}

/// Import programs from a CSV with columns `name,short_code,description`.
/// Programs whose name or code already exist are counted as duplicates.
pub fn import_programs_csv(conn: &Connection, csv_path: &Path) -> StoreResult<ImportSummary> {
    let mut rdr = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary::default();
    let tx = conn.unchecked_transaction()?;

    for (index, result) in rdr.deserialize::<NewProgram>().enumerate() {
        let line = index + 1;
        let Some(program) = parsed_row(result, line, &mut summary)? else {
            continue;
        };

        match write_program(&tx, &program) {
            Ok(_) => summary.inserted += 1,
            Err(StoreError::Validation(errors)) => {
                let duplicate = errors.iter().any(|e| e.message.contains("already exists"));
                if duplicate {
                    summary.duplicates += 1;
                } else {
                    let reason = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
                    tracing::warn!(line, %reason, "rejected program row");
                    summary.rejected.push((line, reason));
                }
            }
            Err(e) => return Err(e),
        }
    }
    tx.commit()?;

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected = summary.rejected.len(),
        path = %csv_path.display(),
        "program import finished"
    );
    Ok(summary)
}
