use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ProcessingError, Result};
use crate::utils::dates::DateRange;

/// Outcome of one (site, variable, window) probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Present,
    Empty,
    /// The fetch itself failed or timed out; coverage is unknown.
    Failed,
}

impl Availability {
    /// 1 / 0 / -1 encoding used in exported availability tables.
    pub fn as_i8(&self) -> i8 {
        match self {
            Availability::Present => 1,
            Availability::Empty => 0,
            Availability::Failed => -1,
        }
    }
}

/// Per-site probe outcomes, each row ordered variable-major then by window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityMatrix {
    variables: Vec<String>,
    windows: Vec<DateRange>,
    sites: Vec<(String, Vec<Availability>)>,
}

impl AvailabilityMatrix {
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn windows(&self) -> &[DateRange] {
        &self.windows
    }

    pub fn site_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sites.iter().map(|(name, _)| name.as_str())
    }

    pub fn row(&self, site: &str) -> Option<&[Availability]> {
        self.sites
            .iter()
            .find(|(name, _)| name == site)
            .map(|(_, cells)| cells.as_slice())
    }

    pub fn cell(&self, site: &str, variable: usize, window: usize) -> Option<Availability> {
        self.row(site)?
            .get(variable * self.windows.len() + window)
            .copied()
    }

    /// Number of cells with data present.
    pub fn score(&self, site: &str) -> usize {
        self.row(site)
            .map(|cells| cells.iter().filter(|c| **c == Availability::Present).count())
            .unwrap_or(0)
    }

    pub fn failures(&self, site: &str) -> usize {
        self.row(site)
            .map(|cells| cells.iter().filter(|c| **c == Availability::Failed).count())
            .unwrap_or(0)
    }

    /// Sites by descending score; ties broken by name.
    pub fn ranking(&self) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .sites
            .iter()
            .map(|(name, _)| (name.clone(), self.score(name)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("=== Availability Matrix ===\n");
        summary.push_str(&format!(
            "Variables: {}, Windows: {}, Sites: {}\n",
            self.variables.len(),
            self.windows.len(),
            self.sites.len()
        ));

        for (name, cells) in &self.sites {
            let encoded: Vec<String> = cells.iter().map(|c| c.as_i8().to_string()).collect();
            summary.push_str(&format!("  {}: [{}]\n", name, encoded.join(", ")));
        }

        summary.push_str("\nRanking:\n");
        let cells_per_site = self.variables.len() * self.windows.len();
        for (i, (name, score)) in self.ranking().iter().enumerate() {
            summary.push_str(&format!(
                "  {}. {} ({}/{} present, {} failed)\n",
                i + 1,
                name,
                score,
                cells_per_site,
                self.failures(name)
            ));
        }

        summary
    }
}

/// Collects probe outcomes by (site, variable, window) position so the
/// finished matrix does not depend on completion order.
#[derive(Debug)]
pub struct AvailabilityMatrixBuilder {
    variables: Vec<String>,
    windows: Vec<DateRange>,
    sites: Vec<String>,
    cells: Vec<Option<Availability>>,
}

impl AvailabilityMatrixBuilder {
    /// Rows are looked up by site label, so labels must be unique.
    pub fn new(sites: Vec<String>, variables: Vec<String>, windows: Vec<DateRange>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(sites.len());
        if let Some(duplicate) = sites.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Site '{}' appears twice in the availability matrix",
                duplicate
            )));
        }

        let size = sites.len() * variables.len() * windows.len();
        Ok(Self {
            variables,
            windows,
            sites,
            cells: vec![None; size],
        })
    }

    fn offset(&self, site: usize, variable: usize, window: usize) -> Option<usize> {
        if site >= self.sites.len() || variable >= self.variables.len() || window >= self.windows.len() {
            return None;
        }
        let per_site = self.variables.len() * self.windows.len();
        Some(site * per_site + variable * self.windows.len() + window)
    }

    pub fn record(
        &mut self,
        site: usize,
        variable: usize,
        window: usize,
        outcome: Availability,
    ) -> Result<()> {
        let offset = self.offset(site, variable, window).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!(
                "Probe cell ({}, {}, {}) is outside the matrix",
                site, variable, window
            ))
        })?;

        if self.cells[offset].is_some() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Probe cell ({}, {}, {}) recorded twice",
                site, variable, window
            )));
        }

        self.cells[offset] = Some(outcome);
        Ok(())
    }

    /// Finish the matrix; cells never recorded count as failures.
    pub fn build(self) -> AvailabilityMatrix {
        let per_site = self.variables.len() * self.windows.len();
        let mut cells = self.cells.into_iter();

        let sites = self
            .sites
            .into_iter()
            .map(|name| {
                let row: Vec<Availability> = cells
                    .by_ref()
                    .take(per_site)
                    .map(|c| c.unwrap_or(Availability::Failed))
                    .collect();
                (name, row)
            })
            .collect();

        AvailabilityMatrix {
            variables: self.variables,
            windows: self.windows,
            sites,
        }
    }
}
