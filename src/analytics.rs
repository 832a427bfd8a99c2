// 📊 Aggregation Engine - raw records → chart-ready series
//
// Pure functions over in-memory snapshots: the same input and window always
// produce the same output.
//
// Malformed records (missing timestamp, missing program_id) are dropped from
// the derivation that needs the missing field and nothing else.

use crate::models::{Client, Dataset, DateWindow, Enrollment, Program, Timestamped};
use chrono::{DateTime, Datelike, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many profession groups the demographics chart keeps
pub const TOP_PROFESSION_LIMIT: usize = 6;

/// Display label for clients without a profession
pub const UNSPECIFIED_PROFESSION: &str = "Not Specified";

// ============================================================================
// TIME-WINDOW FILTER
// ============================================================================

/// Keeps records whose timestamp lies in `window` (inclusive), in input order.
///
/// With no window the input comes back unchanged, including records that have
/// no timestamp at all. With a window, records without a timestamp never match.
pub fn filter_window_by<T, F>(records: &[T], window: Option<&DateWindow>, selector: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    match window {
        None => records.to_vec(),
        Some(window) if window.is_inverted() => Vec::new(),
        Some(window) => records
            .iter()
            .filter(|record| selector(record).is_some_and(|t| window.contains(t)))
            .cloned()
            .collect(),
    }
}

/// Window filter on the record's own timestamp field
pub fn filter_window<T>(records: &[T], window: Option<&DateWindow>) -> Vec<T>
where
    T: Clone + Timestamped,
{
    filter_window_by(records, window, Timestamped::timestamp)
}

// ============================================================================
// AGE BUCKETING
// ============================================================================

/// One named age bucket. `max_age` is inclusive; `None` is unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    pub label: &'static str,
    pub max_age: Option<u32>,
}

/// Dashboard and report bucketing
pub const STANDARD_AGE_BANDS: [AgeBand; 4] = [
    AgeBand { label: "0-18", max_age: Some(18) },
    AgeBand { label: "19-30", max_age: Some(30) },
    AgeBand { label: "31-50", max_age: Some(50) },
    AgeBand { label: "51+", max_age: None },
];

/// Finer bucketing for the demographics chart
pub const DETAILED_AGE_BANDS: [AgeBand; 7] = [
    AgeBand { label: "0-18", max_age: Some(18) },
    AgeBand { label: "19-25", max_age: Some(25) },
    AgeBand { label: "26-35", max_age: Some(35) },
    AgeBand { label: "36-45", max_age: Some(45) },
    AgeBand { label: "46-55", max_age: Some(55) },
    AgeBand { label: "56-65", max_age: Some(65) },
    AgeBand { label: "66+", max_age: None },
];

/// A `name → value` pair, the shape every chart series uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub value: usize,
}

impl NamedCount {
    pub fn new(name: impl Into<String>, value: usize) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Index of the band an age falls into.
///
/// Bands must be ordered by `max_age` and end with an unbounded band; the
/// last band catches anything the earlier ones do not.
fn band_index(bands: &[AgeBand], age: u32) -> usize {
    bands
        .iter()
        .position(|band| band.max_age.map_or(true, |max| age <= max))
        .unwrap_or(bands.len().saturating_sub(1))
}

/// Partitions clients over `bands`; every band appears, in band order
pub fn age_distribution(clients: &[Client], bands: &[AgeBand]) -> Vec<NamedCount> {
    let mut counts = vec![0usize; bands.len()];

    if !bands.is_empty() {
        for client in clients {
            counts[band_index(bands, client.age)] += 1;
        }
    }

    bands
        .iter()
        .zip(counts)
        .map(|(band, value)| NamedCount::new(band.label, value))
        .collect()
}

// ============================================================================
// RESIDENCE + PROFESSION GROUPING
// ============================================================================

/// Groups by exact `area_of_residence` (no trimming, no case folding).
/// Groups come out in first-seen order.
pub fn residence_distribution(clients: &[Client]) -> Vec<NamedCount> {
    let mut groups: IndexMap<&str, usize> = IndexMap::new();

    for client in clients {
        *groups.entry(client.area_of_residence.as_str()).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|(area, value)| NamedCount::new(area, value))
        .collect()
}

/// Profession group. `profession == None` means "not specified".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionCount {
    pub profession: Option<String>,
    pub count: usize,
}

impl ProfessionCount {
    pub fn label(&self) -> &str {
        self.profession.as_deref().unwrap_or(UNSPECIFIED_PROFESSION)
    }

    pub fn to_named(&self) -> NamedCount {
        NamedCount::new(self.label(), self.count)
    }
}

/// The `limit` most common professions, descending by count.
/// Ties keep first-seen order (stable sort).
pub fn top_professions(clients: &[Client], limit: usize) -> Vec<ProfessionCount> {
    let mut groups: IndexMap<Option<&str>, usize> = IndexMap::new();

    for client in clients {
        let key = client
            .profession
            .as_deref()
            .filter(|p| !p.is_empty());
        *groups.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<ProfessionCount> = groups
        .into_iter()
        .map(|(profession, count)| ProfessionCount {
            profession: profession.map(str::to_string),
            count,
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

// ============================================================================
// MONTHLY GROWTH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    /// `YYYY-MM`
    pub date: String,
    pub new_clients: usize,
    pub total_clients: usize,
}

pub fn month_key(instant: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", instant.year(), instant.month())
}

/// Sparse month-by-month series of new and cumulative clients (UTC months).
/// Months without new clients are omitted; clients without `created_at`
/// are not counted.
pub fn monthly_growth(clients: &[Client]) -> Vec<GrowthPoint> {
    let mut per_month: BTreeMap<String, usize> = BTreeMap::new();

    for created_at in clients.iter().filter_map(|c| c.created_at) {
        *per_month.entry(month_key(created_at)).or_insert(0) += 1;
    }

    let mut running_total = 0;
    per_month
        .into_iter()
        .map(|(date, new_clients)| {
            running_total += new_clients;
            GrowthPoint {
                date,
                new_clients,
                total_clients: running_total,
            }
        })
        .collect()
}

// ============================================================================
// PER-PROGRAM ENROLLMENT COUNTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEnrollmentCount {
    pub program_id: i64,
    pub name: String,
    pub short_code: String,
    pub enrollments: usize,
}

/// One row per program, in program order, zero counts included
pub fn program_enrollment_counts(
    programs: &[Program],
    enrollments: &[Enrollment],
) -> Vec<ProgramEnrollmentCount> {
    let mut by_program: IndexMap<i64, usize> = IndexMap::new();
    for program_id in enrollments.iter().filter_map(|e| e.program_id) {
        *by_program.entry(program_id).or_insert(0) += 1;
    }

    programs
        .iter()
        .map(|program| ProgramEnrollmentCount {
            program_id: program.id,
            name: program.name.clone(),
            short_code: program.short_code.clone(),
            enrollments: by_program.get(&program.id).copied().unwrap_or(0),
        })
        .collect()
}

// ============================================================================
// SUMMARY STATISTICS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_clients: usize,
    pub total_programs: usize,
    pub total_enrollments: usize,
    pub average_age: u32,
}

/// Arithmetic mean rounded half-up; 0 for no clients
pub fn average_age(clients: &[Client]) -> u32 {
    if clients.is_empty() {
        return 0;
    }

    let n = clients.len() as u64;
    let sum: u64 = clients.iter().map(|c| u64::from(c.age)).sum();
    // round(sum / n) == floor((2 * sum + n) / (2 * n)) for non-negative values
    ((2 * sum + n) / (2 * n)) as u32
}

pub fn summary_statistics(
    clients: &[Client],
    programs: &[Program],
    enrollments: &[Enrollment],
) -> SummaryStatistics {
    SummaryStatistics {
        total_clients: clients.len(),
        total_programs: programs.len(),
        total_enrollments: enrollments.len(),
        average_age: average_age(clients),
    }
}

// ============================================================================
// ANALYTICS SNAPSHOT (every dashboard series at once)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub window: Option<DateWindow>,
    pub summary: SummaryStatistics,
    pub age_distribution: Vec<NamedCount>,
    pub detailed_age_distribution: Vec<NamedCount>,
    pub residence_distribution: Vec<NamedCount>,
    pub top_professions: Vec<NamedCount>,
    pub monthly_growth: Vec<GrowthPoint>,
    pub program_enrollments: Vec<ProgramEnrollmentCount>,
}

impl AnalyticsSnapshot {
    /// Clients are windowed on `created_at`, enrollments on `enrolled_at`;
    /// programs are never windowed.
    pub fn compute(dataset: &Dataset, window: Option<&DateWindow>) -> Self {
        let clients = filter_window(&dataset.clients, window);
        let enrollments = filter_window(&dataset.enrollments, window);

        Self {
            window: window.copied(),
            summary: summary_statistics(&clients, &dataset.programs, &enrollments),
            age_distribution: age_distribution(&clients, &STANDARD_AGE_BANDS),
            detailed_age_distribution: age_distribution(&clients, &DETAILED_AGE_BANDS),
            residence_distribution: residence_distribution(&clients),
            top_professions: top_professions(&clients, TOP_PROFESSION_LIMIT)
                .iter()
                .map(ProfessionCount::to_named)
                .collect(),
            monthly_growth: monthly_growth(&clients),
            program_enrollments: program_enrollment_counts(&dataset.programs, &enrollments),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    pub(crate) fn client(id: i64, age: u32, area: &str, created: Option<DateTime<Utc>>) -> Client {
        Client {
            id,
            first_name: format!("First{}", id),
            last_name: format!("Last{}", id),
            age,
            phone_number: "+254700000000".to_string(),
            area_of_residence: area.to_string(),
            profession: None,
            created_at: created,
            updated_at: created,
        }
    }

    pub(crate) fn program(id: i64, name: &str, code: &str) -> Program {
        Program {
            id,
            name: name.to_string(),
            short_code: code.to_string(),
            description: format!("{} program", name),
            created_at: None,
            updated_at: None,
        }
    }

    pub(crate) fn enrollment(id: i64, program_id: Option<i64>, enrolled: Option<DateTime<Utc>>) -> Enrollment {
        Enrollment {
            id,
            client_id: Some(1),
            program_id,
            program_name: String::new(),
            program_short_code: String::new(),
            enrollment_id: format!("ENR-{}", id),
            enrolled_at: enrolled,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_standard_age_buckets() {
        let clients = vec![
            client(1, 10, "A", None),
            client(2, 25, "A", None),
            client(3, 40, "A", None),
            client(4, 70, "A", None),
        ];

        let buckets = age_distribution(&clients, &STANDARD_AGE_BANDS);
        assert_eq!(
            buckets,
            vec![
                NamedCount::new("0-18", 1),
                NamedCount::new("19-30", 1),
                NamedCount::new("31-50", 1),
                NamedCount::new("51+", 1),
            ]
        );
    }

    #[test]
    fn test_age_bucket_edges_are_inclusive_upper() {
        let clients = vec![
            client(1, 18, "A", None),
            client(2, 19, "A", None),
            client(3, 30, "A", None),
            client(4, 31, "A", None),
            client(5, 50, "A", None),
            client(6, 51, "A", None),
            client(7, 0, "A", None),
        ];

        let values: Vec<usize> = age_distribution(&clients, &STANDARD_AGE_BANDS)
            .into_iter()
            .map(|b| b.value)
            .collect();
        assert_eq!(values, vec![2, 2, 2, 1]);

        let detailed: Vec<usize> = age_distribution(&clients, &DETAILED_AGE_BANDS)
            .into_iter()
            .map(|b| b.value)
            .collect();
        assert_eq!(detailed, vec![2, 1, 2, 0, 2, 0, 0]);
    }

    #[test]
    fn test_monthly_growth_is_sparse() {
        let clients = vec![
            client(1, 30, "A", Some(at(2024, 1, 3))),
            client(2, 30, "A", Some(at(2024, 3, 15))),
            client(3, 30, "A", Some(at(2024, 1, 28))),
        ];

        let growth = monthly_growth(&clients);
        assert_eq!(
            growth,
            vec![
                GrowthPoint { date: "2024-01".into(), new_clients: 2, total_clients: 2 },
                GrowthPoint { date: "2024-03".into(), new_clients: 1, total_clients: 3 },
            ]
        );
    }

    #[test]
    fn test_monthly_growth_skips_missing_created_at() {
        let clients = vec![
            client(1, 30, "A", None),
            client(2, 30, "A", Some(at(2023, 12, 1))),
        ];
        let growth = monthly_growth(&clients);
        assert_eq!(growth.len(), 1);
        assert_eq!(growth[0].total_clients, 1);
    }

    #[test]
    fn test_growth_serializes_camel_case() {
        let point = GrowthPoint { date: "2024-01".into(), new_clients: 2, total_clients: 2 };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["newClients"], 2);
        assert_eq!(json["totalClients"], 2);
    }

    #[test]
    fn test_program_counts_keep_program_order_and_zeros() {
        let programs = vec![program(1, "HIV", "HIV"), program(2, "TB", "TB"), program(3, "Malaria", "MAL")];
        let enrollments = vec![
            enrollment(1, Some(1), None),
            enrollment(2, Some(1), None),
            enrollment(3, Some(2), None),
        ];

        let counts: Vec<usize> = program_enrollment_counts(&programs, &enrollments)
            .into_iter()
            .map(|p| p.enrollments)
            .collect();
        assert_eq!(counts, vec![2, 1, 0]);
    }

    #[test]
    fn test_enrollment_without_program_is_not_counted() {
        let programs = vec![program(1, "HIV", "HIV")];
        let enrollments = vec![enrollment(1, None, None), enrollment(2, Some(1), None), enrollment(3, Some(99), None)];

        let counts = program_enrollment_counts(&programs, &enrollments);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].enrollments, 1);
    }

    #[test]
    fn test_empty_summary_is_zero_not_error() {
        let summary = summary_statistics(&[], &[], &[]);
        assert_eq!(summary, SummaryStatistics::default());
        assert_eq!(summary.average_age, 0);
    }

    #[test]
    fn test_average_age_rounds_half_up() {
        let clients = vec![client(1, 20, "A", None), client(2, 21, "A", None)];
        assert_eq!(average_age(&clients), 21); // 20.5 → 21

        let clients = vec![client(1, 20, "A", None), client(2, 20, "A", None), client(3, 21, "A", None)];
        assert_eq!(average_age(&clients), 20); // 20.33 → 20
    }

    #[test]
    fn test_residence_exact_string_groups() {
        let clients = vec![
            client(1, 30, "Nairobi", None),
            client(2, 30, "nairobi", None),
            client(3, 30, "Nairobi ", None),
            client(4, 30, "Nairobi", None),
        ];

        let groups = residence_distribution(&clients);
        assert_eq!(
            groups,
            vec![
                NamedCount::new("Nairobi", 2),
                NamedCount::new("nairobi", 1),
                NamedCount::new("Nairobi ", 1),
            ]
        );
    }

    #[test]
    fn test_top_professions_sentinel_and_truncation() {
        let professions = [
            Some("Nurse"), None, Some("Teacher"), Some("Nurse"), Some("Farmer"),
            Some("Driver"), Some("Chef"), Some("Clerk"), Some("Pilot"), Some(""),
        ];
        let clients: Vec<Client> = professions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut c = client(i as i64, 30, "A", None);
                c.profession = p.map(str::to_string);
                c
            })
            .collect();

        let top = top_professions(&clients, TOP_PROFESSION_LIMIT);
        assert_eq!(top.len(), 6);
        // "Not Specified" (None + "") ties with Nurse at 2 but Nurse was seen first
        assert_eq!(top[0].label(), "Nurse");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].label(), UNSPECIFIED_PROFESSION);
        assert_eq!(top[1].profession, None);
        assert_eq!(top[1].count, 2);
        // then the singletons in first-seen order
        let rest: Vec<&str> = top[2..].iter().map(|p| p.label()).collect();
        assert_eq!(rest, vec!["Teacher", "Farmer", "Driver", "Chef"]);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let clients = vec![client(1, 30, "A", Some(at(2024, 1, 15)))];
        let window = DateWindow::new(at(2024, 2, 1), at(2024, 1, 1));
        assert!(filter_window(&clients, Some(&window)).is_empty());
    }

    #[test]
    fn test_window_drops_untimestamped_records() {
        let enrollments = vec![
            enrollment(1, Some(1), Some(at(2024, 1, 10))),
            enrollment(2, Some(1), None),
            enrollment(3, Some(1), Some(at(2024, 5, 10))),
        ];
        let window = DateWindow::new(at(2024, 1, 1), at(2024, 1, 31));

        let filtered = filter_window(&enrollments, Some(&window));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);

        assert_eq!(filter_window(&enrollments, None), enrollments);
    }

    #[test]
    fn test_snapshot_windows_clients_and_enrollments_only() {
        let dataset = Dataset::new(
            vec![
                client(1, 10, "Kisumu", Some(at(2024, 1, 5))),
                client(2, 60, "Mombasa", Some(at(2024, 4, 5))),
            ],
            vec![program(1, "HIV", "HIV"), program(2, "TB", "TB")],
            vec![
                enrollment(1, Some(1), Some(at(2024, 1, 6))),
                enrollment(2, Some(2), Some(at(2024, 4, 6))),
            ],
        );
        let window = DateWindow::new(at(2024, 1, 1), at(2024, 1, 31));

        let snapshot = AnalyticsSnapshot::compute(&dataset, Some(&window));
        assert_eq!(snapshot.summary.total_clients, 1);
        assert_eq!(snapshot.summary.total_programs, 2);
        assert_eq!(snapshot.summary.total_enrollments, 1);
        assert_eq!(snapshot.summary.average_age, 10);
        assert_eq!(snapshot.program_enrollments.len(), 2);
        assert_eq!(snapshot.program_enrollments[1].enrollments, 0);
        assert_eq!(snapshot.residence_distribution, vec![NamedCount::new("Kisumu", 1)]);
        assert_eq!(snapshot.top_professions, vec![NamedCount::new(UNSPECIFIED_PROFESSION, 1)]);
    }

    // ------------------------------------------------------------------------
    // Property tests
    // ------------------------------------------------------------------------

    fn arb_client() -> impl Strategy<Value = Client> {
        (
            0u32..=150,
            prop::sample::select(vec!["Nairobi", "Kisumu", "Mombasa", "nairobi"]),
            prop::option::of(0i64..(5 * 365 * 24 * 3600)),
            prop::option::of(prop::sample::select(vec!["Nurse", "Teacher", "Farmer", "Driver", "Chef", "Clerk", "Pilot"])),
        )
            .prop_map(|(age, area, offset, profession)| {
                let created = offset.map(|secs| at(2020, 1, 1) + chrono::Duration::seconds(secs));
                let mut c = client(0, age, area, created);
                c.profession = profession.map(str::to_string);
                c
            })
    }

    fn arb_window() -> impl Strategy<Value = DateWindow> {
        (0i64..(5 * 365 * 24 * 3600), 0i64..(5 * 365 * 24 * 3600)).prop_map(|(a, b)| {
            DateWindow::new(
                at(2020, 1, 1) + chrono::Duration::seconds(a),
                at(2020, 1, 1) + chrono::Duration::seconds(b),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_age_buckets_partition_clients(clients in prop::collection::vec(arb_client(), 0..64)) {
            let standard: usize = age_distribution(&clients, &STANDARD_AGE_BANDS).iter().map(|b| b.value).sum();
            let detailed: usize = age_distribution(&clients, &DETAILED_AGE_BANDS).iter().map(|b| b.value).sum();
            prop_assert_eq!(standard, clients.len());
            prop_assert_eq!(detailed, clients.len());
        }

        #[test]
        fn prop_residence_counts_sum_to_total(clients in prop::collection::vec(arb_client(), 0..64)) {
            let total: usize = residence_distribution(&clients).iter().map(|g| g.value).sum();
            prop_assert_eq!(total, clients.len());
        }

        #[test]
        fn prop_no_window_is_identity(clients in prop::collection::vec(arb_client(), 0..64)) {
            prop_assert_eq!(filter_window(&clients, None), clients);
        }

        #[test]
        fn prop_window_keeps_order_and_bounds(
            clients in prop::collection::vec(arb_client(), 0..64),
            window in arb_window(),
        ) {
            let filtered = filter_window(&clients, Some(&window));
            let expected: Vec<Client> = clients
                .iter()
                .filter(|c| c.created_at.is_some_and(|t| window.from <= t && t <= window.to))
                .cloned()
                .collect();
            prop_assert_eq!(&filtered, &expected);
            if window.is_inverted() {
                prop_assert!(filtered.is_empty());
            }
        }

        #[test]
        fn prop_running_total_is_prefix_sum(clients in prop::collection::vec(arb_client(), 0..64)) {
            let growth = monthly_growth(&clients);
            let mut sum = 0;
            let mut previous_month = String::new();
            for point in &growth {
                sum += point.new_clients;
                prop_assert_eq!(point.total_clients, sum);
                prop_assert!(point.new_clients > 0);
                prop_assert!(point.date > previous_month);
                previous_month = point.date.clone();
            }
            let dated = clients.iter().filter(|c| c.created_at.is_some()).count();
            prop_assert_eq!(sum, dated);
        }

        #[test]
        fn prop_top_professions_sorted_and_bounded(clients in prop::collection::vec(arb_client(), 0..64)) {
            let top = top_professions(&clients, TOP_PROFESSION_LIMIT);
            prop_assert!(top.len() <= TOP_PROFESSION_LIMIT);
            prop_assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
        }

        #[test]
        fn prop_snapshot_is_deterministic(
            clients in prop::collection::vec(arb_client(), 0..32),
            window in prop::option::of(arb_window()),
        ) {
            let dataset = Dataset::new(clients, vec![program(1, "HIV", "HIV")], vec![]);
            let first = AnalyticsSnapshot::compute(&dataset, window.as_ref());
            let second = AnalyticsSnapshot::compute(&dataset, window.as_ref());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_program_counts_one_row_per_program(
            program_count in 0usize..8,
            program_ids in prop::collection::vec(prop::option::of(0i64..10), 0..40),
        ) {
            let programs: Vec<Program> = (0..program_count as i64)
                .map(|id| program(id, &format!("P{}", id), &format!("P{}", id)))
                .collect();
            let enrollments: Vec<Enrollment> = program_ids
                .iter()
                .enumerate()
                .map(|(i, pid)| enrollment(i as i64, *pid, None))
                .collect();

            let counts = program_enrollment_counts(&programs, &enrollments);
            prop_assert_eq!(counts.len(), programs.len());
            for (row, program) in counts.iter().zip(&programs) {
                prop_assert_eq!(row.program_id, program.id);
            }
        }
    }
}
