//! Run statistics and the end-of-run reporter.
//!
//! [`RunStats`] is owned by the run orchestrator and mutated only by folding
//! in [`RecordReport`]s. Once the run ends it is frozen into a read-only
//! [`RunSummary`].

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::outcome::{OutcomeKind, RecordReport};
use crate::types::Timestamp;

/// Child-association counters for one link collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub added: u64,
    pub skipped: u64,
}

/// Outcome counters for one entity category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
    pub links: IndexMap<&'static str, LinkStats>,
}

impl CategoryStats {
    pub fn count(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::Created => self.created,
            OutcomeKind::Updated => self.updated,
            OutcomeKind::Skipped => self.skipped,
            OutcomeKind::Failed => self.failed,
        }
    }

    /// Number of records observed in this category.
    pub fn total(&self) -> u64 {
        self.created + self.updated + self.skipped + self.failed
    }

    fn bump(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Created => self.created += 1,
            OutcomeKind::Updated => self.updated += 1,
            OutcomeKind::Skipped => self.skipped += 1,
            OutcomeKind::Failed => self.failed += 1,
        }
    }

    fn absorb(&mut self, other: &CategoryStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
        for (counter, link) in &other.links {
            let entry = self.links.entry(*counter).or_default();
            entry.added += link.added;
            entry.skipped += link.skipped;
        }
    }
}

/// Mutable counters for one run.
#[derive(Debug, Clone)]
pub struct RunStats {
    categories: IndexMap<&'static str, CategoryStats>,
    observed: u64,
    started_at: Timestamp,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            categories: IndexMap::new(),
            observed: 0,
            started_at: chrono::Utc::now(),
        }
    }

    /// Make a category appear in the summary even if it sees no records.
    pub fn open_category(&mut self, category: &'static str) {
        self.categories.entry(category).or_default();
    }

    /// Fold one record report into the counters.
    pub fn record(&mut self, report: &RecordReport) {
        let stats = self.categories.entry(report.category).or_default();
        stats.bump(report.outcome.kind());
        for tally in &report.links {
            let link = stats.links.entry(tally.counter).or_default();
            link.added += tally.added;
            link.skipped += tally.skipped;
        }
        self.observed += 1;
    }

    pub fn category(&self, category: &str) -> Option<&CategoryStats> {
        self.categories.get(category)
    }

    /// Number of reports folded in so far.
    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn totals(&self) -> CategoryStats {
        let mut totals = CategoryStats::default();
        for stats in self.categories.values() {
            totals.absorb(stats);
        }
        totals
    }

    /// Freeze the counters.
    pub fn finalize(self, interrupted: bool) -> RunSummary {
        RunSummary {
            totals: self.totals(),
            categories: self.categories,
            started_at: self.started_at,
            finished_at: chrono::Utc::now(),
            interrupted,
        }
    }
}

/// Pure aggregation of a report stream, in arrival order.
pub fn aggregate<'a>(reports: impl IntoIterator<Item = &'a RecordReport>) -> RunSummary {
    let mut stats = RunStats::new();
    for report in reports {
        stats.record(report);
    }
    stats.finalize(false)
}

/// Read-only result of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub categories: IndexMap<&'static str, CategoryStats>,
    pub totals: CategoryStats,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn category(&self, category: &str) -> Option<&CategoryStats> {
        self.categories.get(category)
    }

    pub fn has_failures(&self) -> bool {
        self.totals.failed > 0
    }
}

const RULE: &str = "============================================================";

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Import summary")?;
        writeln!(f, "{RULE}")?;
        let width = self
            .categories
            .keys()
            .map(|k| k.len())
            .max()
            .unwrap_or(0)
            .max("total".len());
        for (name, stats) in &self.categories {
            write_line(f, name, stats, width)?;
            for (counter, link) in &stats.links {
                write!(f, "    {counter}: {}", link.added)?;
                if link.skipped > 0 {
                    write!(f, " ({} skipped)", link.skipped)?;
                }
                writeln!(f)?;
            }
        }
        writeln!(f, "{RULE}")?;
        write_line(f, "total", &self.totals, width)?;
        let elapsed = self.finished_at - self.started_at;
        writeln!(f, "elapsed: {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0)?;
        if self.interrupted {
            writeln!(f, "run interrupted; counts are partial")?;
        } else if self.has_failures() {
            writeln!(f, "completed with errors")?;
        } else {
            writeln!(f, "completed")?;
        }
        write!(f, "{RULE}")
    }
}

fn write_line(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    stats: &CategoryStats,
    width: usize,
) -> fmt::Result {
    write!(f, "{name:<width$}")?;
    for kind in OutcomeKind::ALL {
        write!(f, "  {} {:>4}", kind.as_str(), stats.count(*kind))?;
    }
    writeln!(f)
}
