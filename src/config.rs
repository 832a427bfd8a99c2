use crate::db::DuplicatePolicy;
use crate::export::ExportKind;
use crate::logging::LogFormat;
use crate::models::DateWindow;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "healthcare.db";
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";

/// Options shared by every binary: where the records live and how to log
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(
        long,
        env = "HEALTHCARE_DB",
        value_name = "FILE",
        default_value = DEFAULT_DB_PATH,
        help = "SQLite database holding clients, programs and enrollments",
        global = true
    )]
    pub db: PathBuf,

    #[arg(
        long,
        env = "HEALTHCARE_LOG_FORMAT",
        value_enum,
        value_name = "FORMAT",
        default_value_t = LogFormat::Pretty,
        help = "Log output format (pretty or json)",
        global = true
    )]
    pub log_format: LogFormat,

    #[arg(
        long,
        env = "HEALTHCARE_DUPLICATE_POLICY",
        value_enum,
        value_name = "POLICY",
        default_value_t = DuplicatePolicy::Reject,
        help = "Whether a client may be enrolled in the same program twice",
        global = true
    )]
    pub duplicate_policy: DuplicatePolicy,
}

/// Inclusive calendar-day range; ignored unless both ends are given
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    #[arg(long, value_name = "YYYY-MM-DD", help = "First day of the reporting period")]
    pub from: Option<NaiveDate>,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Last day of the reporting period")]
    pub to: Option<NaiveDate>,
}

impl WindowArgs {
    pub fn window(&self) -> Option<DateWindow> {
        DateWindow::from_optional_dates(self.from, self.to)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "healthcare-dashboard",
    about = "Healthcare program analytics, reports and CSV exports",
    version
)]
pub struct CliArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Import clients and/or programs from CSV files
    Import {
        #[arg(long, value_name = "CSV")]
        clients: Option<PathBuf>,

        #[arg(long, value_name = "CSV")]
        programs: Option<PathBuf>,
    },

    /// Print the analytics snapshot as JSON
    Analytics {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Print the report document
    Report {
        #[command(flatten)]
        window: WindowArgs,

        #[arg(long, help = "Emit JSON instead of plain text")]
        json: bool,
    },

    /// Write CSV export files
    Export {
        #[arg(value_parser = parse_export_kind, help = "clients, programs, enrollments or all")]
        kind: ExportKind,

        #[command(flatten)]
        window: WindowArgs,

        #[arg(long, value_name = "DIR", default_value = ".", help = "Directory for the CSV files")]
        out_dir: PathBuf,
    },

    /// Interactive terminal dashboard (default)
    Tui,
}

fn parse_export_kind(value: &str) -> Result<ExportKind, String> {
    ExportKind::parse(value).ok_or_else(|| {
        format!(
            "unknown export kind '{}' (expected clients, programs, enrollments or all)",
            value
        )
    })
}

#[derive(Parser, Debug, Clone)]
#[command(name = "healthcare-server", about = "Healthcare dashboard HTTP API", version)]
pub struct ServerArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(
        long,
        env = "HEALTHCARE_BIND",
        value_name = "ADDR",
        default_value = DEFAULT_HTTP_BIND,
        help = "HTTP bind address"
    )]
    pub bind: SocketAddr,

    #[arg(
        long,
        env = "HEALTHCARE_ADMIN_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        help = "Bearer token required on API requests (open when unset)"
    )]
    pub admin_token: Option<String>,
}
