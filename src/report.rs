// 🖨️ Report Document - one structure for the on-screen and printed report
//
// The document is data only; the terminal, JSON and print surfaces all
// render the same ReportDocument.

use crate::analytics::{
    age_distribution, filter_window, program_enrollment_counts, summary_statistics, NamedCount,
    ProgramEnrollmentCount, SummaryStatistics, STANDARD_AGE_BANDS,
};
use crate::models::{Dataset, DateWindow};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const REPORT_TITLE: &str = "Healthcare Analytics Report";
pub const CONFIDENTIALITY_NOTICE: &str =
    "This report is confidential and intended for authorized personnel only.";
pub const ORGANIZATION: &str = "Healthcare Management System";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSummaryRow {
    pub name: String,
    pub code: String,
    pub enrollments: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub period: Option<DateWindow>,
    pub generated_at: DateTime<Utc>,
    pub key_metrics: SummaryStatistics,
    pub program_enrollments: Vec<ProgramEnrollmentCount>,
    pub age_distribution: Vec<NamedCount>,
    pub program_summary: Vec<ProgramSummaryRow>,
    pub footer: Vec<String>,
}

impl ReportDocument {
    /// Assembles the report for `dataset` narrowed to `window`.
    ///
    /// `generated_at` is passed in so the same inputs always give the same
    /// document.
    pub fn assemble(dataset: &Dataset, window: Option<&DateWindow>, generated_at: DateTime<Utc>) -> Self {
        let clients = filter_window(&dataset.clients, window);
        let enrollments = filter_window(&dataset.enrollments, window);

        let program_enrollments = program_enrollment_counts(&dataset.programs, &enrollments);
        let program_summary = dataset
            .programs
            .iter()
            .zip(&program_enrollments)
            .map(|(program, counted)| ProgramSummaryRow {
                name: program.name.clone(),
                code: program.short_code.clone(),
                enrollments: counted.enrollments,
                description: program.description.clone(),
            })
            .collect();

        ReportDocument {
            title: REPORT_TITLE.to_string(),
            period: window.copied(),
            generated_at,
            key_metrics: summary_statistics(&clients, &dataset.programs, &enrollments),
            program_enrollments,
            age_distribution: age_distribution(&clients, &STANDARD_AGE_BANDS),
            program_summary,
            footer: vec![
                CONFIDENTIALITY_NOTICE.to_string(),
                format!("© {} {}", generated_at.year(), ORGANIZATION),
            ],
        }
    }

    /// "Period: January 1, 2024 to January 31, 2024"
    pub fn period_line(&self) -> Option<String> {
        self.period.map(|period| {
            format!(
                "Period: {} to {}",
                period.from.format("%B %-d, %Y"),
                period.to.format("%B %-d, %Y")
            )
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "{} clients, {} programs, {} enrollments, average age {}",
            self.key_metrics.total_clients,
            self.key_metrics.total_programs,
            self.key_metrics.total_enrollments,
            self.key_metrics.average_age
        )
    }

    /// Printable plain-text rendering
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        let rule = "━".repeat(60);

        let _ = writeln!(out, "{}", self.title);
        if let Some(period) = self.period_line() {
            let _ = writeln!(out, "{}", period);
        }
        let _ = writeln!(out, "Generated on {}", self.generated_at.format("%Y-%m-%d"));
        let _ = writeln!(out, "{}", rule);

        let _ = writeln!(out, "\nKey Metrics");
        let _ = writeln!(out, "  Total Clients:     {}", self.key_metrics.total_clients);
        let _ = writeln!(out, "  Total Programs:    {}", self.key_metrics.total_programs);
        let _ = writeln!(out, "  Total Enrollments: {}", self.key_metrics.total_enrollments);
        let _ = writeln!(out, "  Average Age:       {}", self.key_metrics.average_age);

        let _ = writeln!(out, "\nProgram Enrollments");
        for row in &self.program_enrollments {
            let _ = writeln!(out, "  {:<30} {:>6}", row.name, row.enrollments);
        }

        let _ = writeln!(out, "\nAge Distribution");
        let total = self.key_metrics.total_clients;
        for bucket in &self.age_distribution {
            let percent = if total == 0 { 0 } else { bucket.value * 100 / total };
            let _ = writeln!(out, "  {:<8} {:>6} ({}%)", bucket.name, bucket.value, percent);
        }

        let _ = writeln!(out, "\nProgram Summary");
        let _ = writeln!(out, "  {:<30} {:<10} {:>11}  Description", "Program Name", "Code", "Enrollments");
        for row in &self.program_summary {
            let _ = writeln!(
                out,
                "  {:<30} {:<10} {:>11}  {}",
                row.name, row.code, row.enrollments, row.description
            );
        }

        let _ = writeln!(out, "\n{}", rule);
        for line in &self.footer {
            let _ = writeln!(out, "{}", line);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::{client, enrollment, program};
    use chrono::{NaiveDate, TimeZone};

    fn sample() -> Dataset {
        let jan = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let mar = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        Dataset::new(
            vec![
                client(1, 10, "Kisumu", Some(jan)),
                client(2, 25, "Kisumu", Some(jan)),
                client(3, 70, "Nairobi", Some(mar)),
            ],
            vec![program(1, "HIV Care", "HIV"), program(2, "TB Care", "TB")],
            vec![
                enrollment(1, Some(1), Some(jan)),
                enrollment(2, Some(1), Some(mar)),
                enrollment(3, Some(2), Some(jan)),
            ],
        )
    }

    #[test]
    fn test_assemble_without_window() {
        let generated = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let doc = ReportDocument::assemble(&sample(), None, generated);

        assert_eq!(doc.title, REPORT_TITLE);
        assert_eq!(doc.period, None);
        assert_eq!(doc.key_metrics.total_clients, 3);
        assert_eq!(doc.key_metrics.total_enrollments, 3);
        assert_eq!(doc.key_metrics.average_age, 35);
        assert_eq!(doc.age_distribution.len(), 4);
        assert_eq!(doc.program_summary[0].enrollments, 2);
        assert_eq!(doc.program_summary[0].code, "HIV");
        assert_eq!(doc.program_summary[1].description, "TB Care program");
        assert_eq!(doc.footer[1], "© 2024 Healthcare Management System");
        assert!(doc.period_line().is_none());
        assert!(!doc.to_plain_text().contains("Period:"));
    }

    #[test]
    fn test_assemble_with_window() {
        let window = DateWindow::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let generated = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let doc = ReportDocument::assemble(&sample(), Some(&window), generated);

        assert_eq!(doc.key_metrics.total_clients, 2);
        assert_eq!(doc.key_metrics.total_programs, 2);
        assert_eq!(doc.key_metrics.total_enrollments, 2);
        let counts: Vec<usize> = doc.program_summary.iter().map(|r| r.enrollments).collect();
        assert_eq!(counts, vec![1, 1]);
        assert_eq!(
            doc.period_line().as_deref(),
            Some("Period: January 1, 2024 to January 31, 2024")
        );

        let text = doc.to_plain_text();
        assert!(text.contains("Period: January 1, 2024 to January 31, 2024"));
        assert!(text.contains("Generated on 2024-04-01"));
        assert!(text.contains(CONFIDENTIALITY_NOTICE));
    }

    #[test]
    fn test_empty_dataset_report() {
        let generated = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let doc = ReportDocument::assemble(&Dataset::default(), None, generated);
        assert_eq!(doc.key_metrics, SummaryStatistics::default());
        assert!(doc.program_summary.is_empty());
        assert!(doc.age_distribution.iter().all(|b| b.value == 0));
        // renders without dividing by zero
        assert!(doc.to_plain_text().contains("0-18"));
    }

    #[test]
    fn test_same_inputs_same_document() {
        let generated = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let first = ReportDocument::assemble(&sample(), None, generated);
        let second = ReportDocument::assemble(&sample(), None, generated);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
