use crate::types::{ConflictRecord, DependencyCheck};
use crate::version::Staleness;
use colored::Colorize;

/// One line of a status table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub name: String,
    pub current: String,
    pub latest: String,
    pub status: Staleness,
}

impl From<&DependencyCheck> for TableRow {
    fn from(check: &DependencyCheck) -> Self {
        Self {
            name: check.dependency.name.clone(),
            current: check.dependency.version_or_sentinel().to_string(),
            latest: check.latest.to_string(),
            status: check.status,
        }
    }
}

/// Renders dependency checks and conflicts as terminal tables
pub struct TableRenderer {
    show_colors: bool,
}

impl TableRenderer {
    pub fn new(show_colors: bool) -> Self {
        Self { show_colors }
    }

    /// Render a titled group of checks
    pub fn render(&self, title: &str, checks: &[DependencyCheck]) {
        let rows: Vec<TableRow> = checks.iter().map(TableRow::from).collect();
        self.render_rows(title, &rows);
    }

    /// Render a titled group of rows
    pub fn render_rows(&self, title: &str, rows: &[TableRow]) {
        if rows.is_empty() {
            return;
        }

        if self.show_colors {
            println!("{}\n", title.bold());
        } else {
            println!("{title}\n");
        }

        // Calculate column widths
        let max_name = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
        let max_from = rows.iter().map(|r| r.current.chars().count()).max().unwrap_or(0);
        let max_to = rows.iter().map(|r| r.latest.chars().count()).max().unwrap_or(0);

        for row in rows {
            self.print_row(row, max_name, max_from, max_to);
        }
        println!();
    }

    fn print_row(&self, row: &TableRow, name_width: usize, from_width: usize, to_width: usize) {
        println!(
            "  {} {:<name_width$}  {:>from_width$} → {:<to_width$}  {}",
            row.status.symbol(),
            row.name,
            row.current,
            row.latest,
            self.format_status(row.status),
        );
    }

    /// Render conflicting declarations grouped by package
    pub fn render_conflicts(&self, conflicts: &[ConflictRecord]) {
        if conflicts.is_empty() {
            return;
        }

        let header = "Conflicting versions:";
        if self.show_colors {
            println!("{}\n", header.yellow().bold());
        } else {
            println!("{header}\n");
        }

        for conflict in conflicts {
            println!(
                "  {} ({})",
                conflict.package_name,
                conflict.distinct_versions().join(", ")
            );
            for occurrence in &conflict.occurrences {
                println!(
                    "    {} → {}",
                    occurrence.module_name, occurrence.version_spec
                );
            }
        }
    }

    /// Format a status label with optional colors
    pub fn format_status(&self, status: Staleness) -> String {
        let label = status.label();
        if !self.show_colors {
            return label.to_string();
        }
        match status {
            Staleness::MajorBehind => label.red().to_string(),
            Staleness::MinorBehind => label.yellow().to_string(),
            Staleness::UpToDate => label.green().to_string(),
            Staleness::Undetermined => label.dimmed().to_string(),
        }
    }
}
