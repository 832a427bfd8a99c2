// 🧾 Record Models - Client, Program, Enrollment
// Read-only snapshots pulled from the record store.
//
// Fields a partially loaded record may lack are Option. A missing value
// excludes the record from the derivation that needs it.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// CLIENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub phone_number: String,
    pub area_of_residence: String,

    /// Absent and empty professions are the same thing: `None`
    #[serde(default, deserialize_with = "empty_as_none")]
    pub profession: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Payload for registering a new client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub phone_number: String,
    pub area_of_residence: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub profession: Option<String>,
}

// ============================================================================
// PROGRAM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub short_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProgram {
    pub name: String,
    pub short_code: String,
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// ENROLLMENT
// ============================================================================

/// Join row between one client and one program.
///
/// `id` is the record identity; `enrollment_id` is the business identifier
/// shown to staff. `program_name` / `program_short_code` are denormalized
/// copies for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub program_name: String,
    #[serde(default)]
    pub program_short_code: String,
    #[serde(default)]
    pub enrollment_id: String,
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub client_id: i64,
    pub program_id: i64,
}

// ============================================================================
// DATASET (the snapshot triple handed to analytics and reports)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub clients: Vec<Client>,
    pub programs: Vec<Program>,
    pub enrollments: Vec<Enrollment>,
}

impl Dataset {
    pub fn new(clients: Vec<Client>, programs: Vec<Program>, enrollments: Vec<Enrollment>) -> Self {
        Self {
            clients,
            programs,
            enrollments,
        }
    }
}

// ============================================================================
// TIME WINDOW
// ============================================================================

/// Inclusive `[from, to]` instant range.
///
/// An inverted window (`from > to`) is allowed: it simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Whole calendar days: `from` at midnight through the last instant of `to`.
    /// A `to` at the end of the representable calendar saturates.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN));
        let end = Utc
            .from_utc_datetime(&to.and_time(NaiveTime::MIN))
            .checked_add_signed(Duration::days(1))
            .map(|next_midnight| next_midnight - Duration::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(start, end)
    }

    /// The dashboard's default range: the `days` days up to `now`
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self::new(now - Duration::days(days), now)
    }

    /// Builds a window only when both ends are given
    pub fn from_optional_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<Self> {
        match (from, to) {
            (Some(from), Some(to)) => Some(Self::from_dates(from, to)),
            _ => None,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }

    pub fn is_inverted(&self) -> bool {
        self.from > self.to
    }
}

// ============================================================================
// TIMESTAMPED (which field the window applies to)
// ============================================================================

/// Records that carry their own timestamp for window filtering
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for Client {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Timestamped for Enrollment {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.enrolled_at
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
