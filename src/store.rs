// 🗄️ Record Store - the seam between surfaces (CLI, TUI, HTTP) and storage
//
// Surfaces talk to `RecordStore`; `SqliteStore` is the production backend.

use crate::db::{self, DuplicatePolicy, ImportSummary};
use crate::error::StoreResult;
use crate::models::{Client, Dataset, Enrollment, NewClient, NewEnrollment, NewProgram, Program};
use rusqlite::Connection;
use std::path::Path;

pub trait RecordStore {
    fn create_client(&self, client: &NewClient) -> StoreResult<Client>;
    fn create_program(&self, program: &NewProgram) -> StoreResult<Program>;
    fn enroll_client(&self, enrollment: &NewEnrollment) -> StoreResult<Enrollment>;

    fn fetch_clients(&self) -> StoreResult<Vec<Client>>;
    fn fetch_client(&self, id: i64) -> StoreResult<Option<Client>>;
    fn fetch_programs(&self) -> StoreResult<Vec<Program>>;
    fn fetch_enrollments(&self) -> StoreResult<Vec<Enrollment>>;
    fn fetch_client_enrollments(&self, client_id: i64) -> StoreResult<Vec<Enrollment>>;
    fn search_clients(&self, query: &str) -> StoreResult<Vec<Client>>;

    /// Snapshot triple for analytics, reports and exports
    fn load_dataset(&self) -> StoreResult<Dataset> {
        Ok(Dataset::new(
            self.fetch_clients()?,
            self.fetch_programs()?,
            self.fetch_enrollments()?,
        ))
    }
}

pub struct SqliteStore {
    conn: Connection,
    policy: DuplicatePolicy,
}

impl SqliteStore {
    /// Opens (or creates) the database file and ensures the schema exists
    pub fn open(path: impl AsRef<Path>, policy: DuplicatePolicy) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn, policy)
    }

    pub fn open_in_memory(policy: DuplicatePolicy) -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, policy)
    }

    pub fn from_connection(conn: Connection, policy: DuplicatePolicy) -> StoreResult<Self> {
        db::setup_database(&conn)?;
        Ok(Self { conn, policy })
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn import_clients_csv(&self, path: &Path) -> StoreResult<ImportSummary> {
        db::import_clients_csv(&self.conn, path)
    }

    pub fn import_programs_csv(&self, path: &Path) -> StoreResult<ImportSummary> {
        db::import_programs_csv(&self.conn, path)
    }
}

impl RecordStore for SqliteStore {
    fn create_client(&self, client: &NewClient) -> StoreResult<Client> {
        db::insert_client(&self.conn, client)
    }

    fn create_program(&self, program: &NewProgram) -> StoreResult<Program> {
        db::insert_program(&self.conn, program)
    }

    fn enroll_client(&self, enrollment: &NewEnrollment) -> StoreResult<Enrollment> {
        db::insert_enrollment(&self.conn, enrollment, self.policy)
    }

    fn fetch_clients(&self) -> StoreResult<Vec<Client>> {
        db::get_all_clients(&self.conn)
    }

    fn fetch_client(&self, id: i64) -> StoreResult<Option<Client>> {
        db::get_client(&self.conn, id)
    }

    fn fetch_programs(&self) -> StoreResult<Vec<Program>> {
        db::get_all_programs(&self.conn)
    }

    fn fetch_enrollments(&self) -> StoreResult<Vec<Enrollment>> {
        db::get_all_enrollments(&self.conn)
    }

    fn fetch_client_enrollments(&self, client_id: i64) -> StoreResult<Vec<Enrollment>> {
        db::get_enrollments_for_client(&self.conn, client_id)
    }

    fn search_clients(&self, query: &str) -> StoreResult<Vec<Client>> {
        db::search_clients(&self.conn, query)
    }

    fn load_dataset(&self) -> StoreResult<Dataset> {
        db::load_dataset(&self.conn)
    }
}
