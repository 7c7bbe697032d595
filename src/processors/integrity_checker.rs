use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;

use crate::models::MergedTable;
use crate::utils::constants::{LATITUDE_COLUMN, LONGITUDE_COLUMN};

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub total_rows: usize,
    pub first_instant: Option<NaiveDateTime>,
    pub last_instant: Option<NaiveDateTime>,
    pub violations: Vec<TableViolation>,
    pub column_coverage: Vec<ColumnCoverage>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TableViolation {
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    NonIncreasingIndex,
    HourlyGap,
    OffGridInstant,
    DuplicateColumn,
    ExtraSpatialColumns,
}

#[derive(Debug, Clone)]
pub struct ColumnCoverage {
    pub column: String,
    pub present: usize,
}

/// Checks the structural guarantees of a finished hourly table.
pub struct IntegrityChecker {
    step: Duration,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            step: Duration::hours(1),
        }
    }

    /// Check a table. Problems are collected in the report, never raised.
    pub fn check_table(&self, table: &MergedTable) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_rows: table.len(),
            first_instant: table.index().first().copied(),
            last_instant: table.index().last().copied(),
            violations: Vec::new(),
            column_coverage: Vec::new(),
        };

        self.check_index(table, &mut report);
        self.check_columns(table, &mut report);

        report.column_coverage = table
            .columns()
            .iter()
            .map(|column| ColumnCoverage {
                column: column.clone(),
                present: table.coverage(column),
            })
            .collect();

        report
    }

    fn check_index(&self, table: &MergedTable, report: &mut IntegrityReport) {
        for instant in table.index() {
            if instant.and_utc().timestamp() % self.step.num_seconds() != 0 {
                report.violations.push(TableViolation {
                    violation_type: ViolationType::OffGridInstant,
                    details: format!("{} is not on the hour", instant),
                });
            }
        }

        for window in table.index().windows(2) {
            let (prev, curr) = (window[0], window[1]);

            if curr <= prev {
                report.violations.push(TableViolation {
                    violation_type: ViolationType::NonIncreasingIndex,
                    details: format!("{} does not follow {}", curr, prev),
                });
            } else if curr - prev > self.step {
                report.violations.push(TableViolation {
                    violation_type: ViolationType::HourlyGap,
                    details: format!(
                        "{} missing hours between {} and {}",
                        (curr - prev).num_hours() - 1,
                        prev,
                        curr
                    ),
                });
            }
        }
    }

    fn check_columns(&self, table: &MergedTable, report: &mut IntegrityReport) {
        let mut seen = HashSet::new();
        for column in table.columns() {
            if !seen.insert(column.as_str()) {
                report.violations.push(TableViolation {
                    violation_type: ViolationType::DuplicateColumn,
                    details: format!("Column '{}' appears more than once", column),
                });
            }
        }

        // Suffixed copies left behind by a naive join
        let spatial: Vec<&String> = table
            .columns()
            .iter()
            .filter(|c| c.starts_with(LATITUDE_COLUMN) || c.starts_with(LONGITUDE_COLUMN))
            .collect();
        if spatial.len() > 2 {
            report.violations.push(TableViolation {
                violation_type: ViolationType::ExtraSpatialColumns,
                details: format!("Expected one latitude/longitude pair, found {:?}", spatial),
            });
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Total Rows: {}\n", report.total_rows));
        if let (Some(first), Some(last)) = (report.first_instant, report.last_instant) {
            summary.push_str(&format!("Span: {} to {}\n", first, last));
        }

        if !report.column_coverage.is_empty() {
            summary.push_str("\nColumn Coverage:\n");
            for coverage in &report.column_coverage {
                let percent = if report.total_rows == 0 {
                    0.0
                } else {
                    100.0 * coverage.present as f64 / report.total_rows as f64
                };
                summary.push_str(&format!(
                    "  {}: {} ({:.1}%)\n",
                    coverage.column, coverage.present, percent
                ));
            }
        }

        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));
        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {:?}: {}\n",
                    i + 1,
                    violation.violation_type,
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}
