//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of harvest runs,
//! including the searches walked, record outcomes and per-tag counts.

use crate::output::traits::{OutputResult, RunSummary};
use crate::state::VisitOutcome;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a run
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

fn outcome_label(outcome: VisitOutcome) -> &'static str {
    match outcome {
        VisitOutcome::Extracted => "Extracted",
        VisitOutcome::ListingOnly => "Listing only (no detail link)",
        VisitOutcome::TimedOut => "Timed out (preview only)",
        VisitOutcome::NavigationFailed => "Navigation failed (preview only)",
        VisitOutcome::Stale => "Stale (skipped)",
    }
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Job-Harvest Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    if !summary.site.is_empty() {
        md.push_str(&format!("- **Site**: {}\n", summary.site));
    }
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    if let Some(reason) = &summary.block_reason {
        md.push_str(&format!("- **Blocked by**: {}\n", reason));
    }
    if let Some(error) = &summary.error {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    if summary.status != "completed" {
        md.push_str("> This run ended early; the dataset holds only the records collected before it stopped.\n\n");
    }

    // Searches
    if !summary.targets.is_empty() {
        md.push_str("## Searches\n\n");
        md.push_str("| Tag | Max Pages | URL |\n");
        md.push_str("|-----|-----------|-----|\n");
        for target in &summary.targets {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                target.tag.as_deref().unwrap_or("-"),
                target.max_pages,
                target.url
            ));
        }
        md.push('\n');
    }

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Records Emitted**: {}\n",
        summary.records_emitted
    ));
    md.push_str(&format!(
        "- **Unique Postings**: {}\n",
        summary.unique_postings
    ));
    if let Some(pages) = summary.pages_walked {
        md.push_str(&format!("- **Result Pages Walked**: {}\n", pages));
    }
    if let Some(stale) = summary.stale_pages.filter(|&stale| stale > 0) {
        md.push_str(&format!("- **Result Pages Skipped (stale)**: {}\n", stale));
    }
    if let Some(failures) = summary.failures {
        md.push_str(&format!("- **Navigation Failures**: {}\n", failures));
    }
    md.push_str(&format!(
        "- **Degraded Records**: {:.2}%\n\n",
        summary.degraded_rate()
    ));

    // Outcome breakdown
    md.push_str("## Listing Outcomes\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    for outcome in VisitOutcome::all() {
        let count = match (outcome, summary.stale_listings) {
            (VisitOutcome::Stale, Some(stale)) => stale,
            _ => summary.outcome_count(outcome),
        };
        md.push_str(&format!("| {} | {} |\n", outcome_label(outcome), count));
    }
    md.push('\n');

    // Tags
    if !summary.records_by_tag.is_empty() {
        md.push_str("## Records per Tag\n\n");
        md.push_str("| Tag | Records |\n");
        md.push_str("|-----|---------|\n");
        for (tag, count) in &summary.records_by_tag {
            md.push_str(&format!("| {} | {} |\n", tag, count));
        }
        md.push('\n');
    }

    md
}
