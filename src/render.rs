//! Terminal rendering for run reports.
//!
//! Extension traits that add colored output to icalsync-core types.

use icalsync_core::diff::DiffKind;
use icalsync_core::sync::{PlannedChanges, RunReport, SourceReport, SourceStatus};
use icalsync_core::SyncStats;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            DiffKind::Create => symbol.green().to_string(),
            DiffKind::Update => symbol.yellow().to_string(),
            DiffKind::Delete => symbol.red().to_string(),
        }
    }
}

/// Above this many planned UIDs only the count is shown
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

impl Render for SyncStats {
    fn render(&self) -> String {
        let mut parts = vec![
            format!("{} {} created", DiffKind::Create.render(), self.created),
            format!("{} {} updated", DiffKind::Update.render(), self.updated),
            format!("{} {} deleted", DiffKind::Delete.render(), self.deleted),
            format!("{} unchanged", self.unchanged).dimmed().to_string(),
        ];
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed).red().to_string());
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped).yellow().to_string());
        }
        parts.join("  ")
    }
}

fn render_uids(kind: DiffKind, uids: &[String], lines: &mut Vec<String>) {
    if uids.len() <= COMPACT_THRESHOLD {
        for uid in uids {
            lines.push(format!("   {} {}", kind.render(), uid));
        }
    } else {
        let label = format!("({} {})", uids.len(), pluralize("event", uids.len()));
        lines.push(format!("   {} {}", kind.render(), label.dimmed()));
    }
}

impl Render for PlannedChanges {
    fn render(&self) -> String {
        let mut lines = Vec::new();
        render_uids(DiffKind::Create, &self.create, &mut lines);
        render_uids(DiffKind::Update, &self.update, &mut lines);
        render_uids(DiffKind::Delete, &self.delete, &mut lines);
        lines.join("\n")
    }
}

impl Render for SourceReport {
    fn render(&self) -> String {
        let header = format!("📅 {} {}", self.name.bold(), format!("({})", self.planning_id).dimmed());

        let body = match &self.status {
            SourceStatus::Ok => {
                let mut lines = vec![format!("   {}", self.stats.render())];
                if let Some(planned) = self.planned.as_ref().filter(|p| {
                    !(p.create.is_empty() && p.update.is_empty() && p.delete.is_empty())
                }) {
                    lines.push(planned.render());
                }
                lines.join("\n")
            }
            SourceStatus::Failed(e) => format!("   {}", e.red()),
            SourceStatus::Disabled => format!("   {}", "disabled".dimmed()),
        };

        format!("{header}\n{body}")
    }
}

impl Render for RunReport {
    fn render(&self) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if self.dry_run {
            blocks.push("Dry run: nothing was written".yellow().to_string());
        }

        blocks.extend(self.sources.iter().map(Render::render));

        let failed = self.failed();
        let sources_line = format!(
            "Sources: {} attempted, {} succeeded, {}",
            self.attempted(),
            self.succeeded(),
            if failed > 0 {
                format!("{failed} failed").red().to_string()
            } else {
                "0 failed".to_string()
            }
        );
        blocks.push(format!("{}\nEvents:  {}", sources_line, self.totals().render()));

        blocks.join("\n\n")
    }
}
