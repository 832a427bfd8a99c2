// 📤 CSV Export - entity lists → downloadable CSV payloads
//
// Column headers come from a fixed per-entity schema, never from the keys of
// the first record. An empty list yields the header row alone.

use crate::analytics::filter_window;
use crate::error::ExportError;
use crate::models::{Client, Dataset, DateWindow, Enrollment, Program};
use serde::{Deserialize, Serialize};

// ============================================================================
// EXPORT RECORD (explicit schema per entity)
// ============================================================================

pub trait ExportRecord {
    /// Column names, in output order
    const HEADERS: &'static [&'static str];

    /// One string per header, same order
    fn fields(&self) -> Vec<String>;
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn timestamp(value: &Option<chrono::DateTime<chrono::Utc>>) -> String {
    value.map(|t| t.to_rfc3339()).unwrap_or_default()
}

impl ExportRecord for Client {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "age",
        "phone_number",
        "area_of_residence",
        "profession",
        "created_at",
        "updated_at",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.age.to_string(),
            self.phone_number.clone(),
            self.area_of_residence.clone(),
            optional(&self.profession),
            timestamp(&self.created_at),
            timestamp(&self.updated_at),
        ]
    }
}

impl ExportRecord for Program {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "name",
        "short_code",
        "description",
        "created_at",
        "updated_at",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.short_code.clone(),
            self.description.clone(),
            timestamp(&self.created_at),
            timestamp(&self.updated_at),
        ]
    }
}

impl ExportRecord for Enrollment {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "client_id",
        "program_id",
        "program_name",
        "program_short_code",
        "enrollment_id",
        "enrolled_at",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            optional(&self.client_id),
            optional(&self.program_id),
            self.program_name.clone(),
            self.program_short_code.clone(),
            self.enrollment_id.clone(),
            timestamp(&self.enrolled_at),
        ]
    }
}

// ============================================================================
// CSV SERIALIZATION
// ============================================================================

/// Header row plus one row per record, each line ending in `\n`.
///
/// Fields containing a comma, a double quote or a line break are quoted with
/// inner quotes doubled. An empty slice produces the header row alone.
pub fn to_csv<T: ExportRecord>(records: &[T]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(T::HEADERS)?;
    for record in records {
        writer.write_record(record.fields())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Parsed CSV payload: the header row and the data rows as strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Value of `column` in row `index`
    pub fn get(&self, index: usize, column: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == column)?;
        self.rows.get(index)?.get(col).map(String::as_str)
    }
}

/// Reads a payload produced by [`to_csv`] (or any standard CSV) back
pub fn parse_csv(content: &str) -> Result<CsvTable, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

    Ok(CsvTable { headers, rows })
}

// ============================================================================
// EXPORT PAYLOADS (what the download mechanism receives)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Clients,
    Programs,
    Enrollments,
    All,
}

impl ExportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "clients" => Some(ExportKind::Clients),
            "programs" => Some(ExportKind::Programs),
            "enrollments" => Some(ExportKind::Enrollments),
            "all" => Some(ExportKind::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Clients => "clients",
            ExportKind::Programs => "programs",
            ExportKind::Enrollments => "enrollments",
            ExportKind::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub filename: String,
    pub content: String,
}

impl ExportPayload {
    pub const CONTENT_TYPE: &'static str = "text/csv;charset=utf-8";

    fn build<T: ExportRecord>(stem: &str, records: &[T]) -> Result<Self, ExportError> {
        Ok(ExportPayload {
            filename: format!("{}-export.csv", stem),
            content: to_csv(records)?,
        })
    }
}

/// Builds the payload(s) for one export action.
///
/// Clients are windowed on `created_at`, enrollments on `enrolled_at`;
/// programs are exported whole. `All` yields three payloads prefixed `all-`.
pub fn export_dataset(
    kind: ExportKind,
    dataset: &Dataset,
    window: Option<&DateWindow>,
) -> Result<Vec<ExportPayload>, ExportError> {
    let clients = || filter_window(&dataset.clients, window);
    let enrollments = || filter_window(&dataset.enrollments, window);

    let payloads = match kind {
        ExportKind::Clients => vec![ExportPayload::build("clients", &clients())?],
        ExportKind::Programs => vec![ExportPayload::build("programs", &dataset.programs)?],
        ExportKind::Enrollments => vec![ExportPayload::build("enrollments", &enrollments())?],
        ExportKind::All => vec![
            ExportPayload::build("all-clients", &clients())?,
            ExportPayload::build("all-programs", &dataset.programs)?,
            ExportPayload::build("all-enrollments", &enrollments())?,
        ],
    };

    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::{client, enrollment, program};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    #[test]
    fn test_comma_field_is_quoted_and_recoverable() {
        let mut c = client(1, 30, "Nairobi", None);
        c.first_name = "A,B".to_string();

        let csv = to_csv(&[c]).unwrap();
        let line = csv.lines().nth(1).unwrap();
        assert!(line.starts_with("1,\"A,B\",Last1,30,"), "got {}", line);

        let table = parse_csv(&csv).unwrap();
        assert_eq!(table.get(0, "first_name"), Some("A,B"));
    }

    #[test]
    fn test_quotes_and_newlines_escaped() {
        let mut p = program(3, "Mother \"and\" Child", "MCH");
        p.description = "line one\nline two".to_string();

        let csv = to_csv(&[p]).unwrap();
        assert!(csv.contains("\"Mother \"\"and\"\" Child\""));
        assert!(csv.contains("\"line one\nline two\""));

        let table = parse_csv(&csv).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.get(0, "name"), Some("Mother \"and\" Child"));
        assert_eq!(table.get(0, "description"), Some("line one\nline two"));
    }

    #[test]
    fn test_empty_list_is_header_only() {
        let csv = to_csv::<Enrollment>(&[]).unwrap();
        assert_eq!(
            csv,
            "id,client_id,program_id,program_name,program_short_code,enrollment_id,enrolled_at\n"
        );
        let table = parse_csv(&csv).unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.headers.len(), Enrollment::HEADERS.len());
    }

    #[test]
    fn test_missing_optionals_are_empty_fields() {
        let e = enrollment(5, None, None);
        let csv = to_csv(&[e]).unwrap();
        assert_eq!(csv.lines().nth(1), Some("5,1,,,,ENR-5,"));
    }

    #[test]
    fn test_export_filenames() {
        let dataset = Dataset::new(vec![], vec![program(1, "HIV", "HIV")], vec![]);

        let single = export_dataset(ExportKind::Clients, &dataset, None).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].filename, "clients-export.csv");

        let all = export_dataset(ExportKind::All, &dataset, None).unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["all-clients-export.csv", "all-programs-export.csv", "all-enrollments-export.csv"]
        );
    }

    #[test]
    fn test_export_respects_window() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let jun = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let dataset = Dataset::new(
            vec![client(1, 30, "A", Some(jan)), client(2, 40, "B", Some(jun))],
            vec![program(1, "HIV", "HIV")],
            vec![enrollment(1, Some(1), Some(jun))],
        );
        let window = DateWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
        );

        let payloads = export_dataset(ExportKind::All, &dataset, Some(&window)).unwrap();
        assert_eq!(parse_csv(&payloads[0].content).unwrap().rows.len(), 1);
        assert_eq!(parse_csv(&payloads[1].content).unwrap().rows.len(), 1);
        assert_eq!(parse_csv(&payloads[2].content).unwrap().rows.len(), 0);
    }

    #[test]
    fn test_export_kind_parse() {
        assert_eq!(ExportKind::parse("Clients"), Some(ExportKind::Clients));
        assert_eq!(ExportKind::parse("all"), Some(ExportKind::All));
        assert_eq!(ExportKind::parse("payments"), None);
    }

    proptest! {
        #[test]
        fn prop_csv_round_trip(
            rows in prop::collection::vec(
                ("[a-zA-Z ,\"\n]{0,12}", "[a-zA-Z ,\"\n]{0,12}", 0u32..120),
                0..16,
            )
        ) {
            let clients: Vec<Client> = rows
                .iter()
                .enumerate()
                .map(|(i, (first, area, age))| {
                    let mut c = client(i as i64, *age, area, None);
                    c.first_name = first.clone();
                    c
                })
                .collect();

            let table = parse_csv(&to_csv(&clients).unwrap()).unwrap();
            prop_assert_eq!(table.rows.len(), clients.len());
            for (row, original) in table.rows.iter().zip(&clients) {
                prop_assert_eq!(row, &original.fields());
            }
        }
    }
}
