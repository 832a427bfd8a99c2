// Healthcare Dashboard - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod models;
pub mod analytics;      // Aggregation Engine
pub mod export;         // CSV export payloads
pub mod report;         // Report document
pub mod error;
pub mod validation;
pub mod db;             // SQLite record store + audit trail
pub mod store;          // RecordStore seam
pub mod pagination;
pub mod session;
pub mod config;
pub mod logging;

#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use models::{
    Client, NewClient, Program, NewProgram, Enrollment, NewEnrollment,
    Dataset, DateWindow, Timestamped,
};
pub use analytics::{
    AnalyticsSnapshot, AgeBand, NamedCount, ProfessionCount, GrowthPoint,
    ProgramEnrollmentCount, SummaryStatistics,
    filter_window, filter_window_by, age_distribution, residence_distribution,
    top_professions, monthly_growth, program_enrollment_counts, summary_statistics,
    STANDARD_AGE_BANDS, DETAILED_AGE_BANDS,
};
pub use export::{
    ExportRecord, ExportKind, ExportPayload, CsvTable,
    to_csv, parse_csv, export_dataset,
};
pub use report::{ReportDocument, ProgramSummaryRow};
pub use error::{StoreError, ExportError, StoreResult};
pub use validation::{ValidationError, ValidationResult, validate_new_client, validate_new_program};
pub use db::{
    DuplicatePolicy, Event, ImportSummary,
    setup_database, insert_event, get_events_for_entity,
    import_clients_csv, import_programs_csv, load_dataset, verify_counts,
};
pub use store::{RecordStore, SqliteStore};
pub use pagination::{Page, paginate, DEFAULT_PAGE_SIZE};
pub use session::SessionGate;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
