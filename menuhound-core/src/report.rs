//! Output writers: places.json, places.csv and the run summary.

use crate::collect::CollectStats;
use crate::place::PlaceRecord;
use menuhound_crawler::{CrawlResult, LinkKind};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// The fixed CSV column set. Nested fields are JSON-encoded strings so the
/// CSV stays one row per restaurant.
const CSV_COLUMNS: &[&str] = &[
    "place_id",
    "name",
    "lat",
    "lng",
    "formatted_address",
    "rating",
    "user_ratings_total",
    "website",
    "opening_hours_json",
    "photo_local_paths_json",
    "menu_photo_paths_json",
    "menu_urls_json",
    "source_timestamp",
];

pub fn write_json(records: &[PlaceRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(records)?;
    fs::write(path, body)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn write_csv(records: &[PlaceRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');

    for record in records {
        let fields = [
            csv_escape(&record.place_id),
            csv_escape(&record.name),
            record.lat.to_string(),
            record.lng.to_string(),
            csv_escape(&record.formatted_address),
            record.rating.map(|r| r.to_string()).unwrap_or_default(),
            record.user_ratings_total.map(|n| n.to_string()).unwrap_or_default(),
            csv_escape(record.website.as_deref().unwrap_or_default()),
            csv_escape(&serde_json::to_string(&record.opening_hours)?),
            csv_escape(&serde_json::to_string(&record.photo_local_paths)?),
            csv_escape(&serde_json::to_string(&record.menu_photo_paths)?),
            csv_escape(&serde_json::to_string(&record.menu_urls)?),
            csv_escape(&record.source_timestamp),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    fs::write(path, out)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Quote a CSV field when it needs it, doubling embedded quotes.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Human-readable summary of a collection run.
pub fn generate_run_summary(records: &[PlaceRecord], stats: &CollectStats) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Places enriched: {}\n", stats.places_processed));
    report.push_str(&format!("  Places failed:   {}\n", stats.places_failed));
    report.push_str(&format!("  Photos saved:    {}\n", stats.photos_downloaded));
    report.push_str(&format!("  Menu photos:     {}\n", stats.menu_photos_flagged));
    report.push_str(&format!("  Menu URLs found: {}\n", stats.menu_urls_found));
    if stats.sites_without_website > 0 {
        report.push_str(&format!("  No website:      {}\n", stats.sites_without_website));
    }
    if stats.cancelled {
        report.push_str("  Run was cancelled before completing.\n");
    }

    let with_menus = records.iter().filter(|r| !r.menu_urls.is_empty()).count();
    if stats.menu_urls_found > 0 {
        report.push_str(&format!("  Places with menu URLs: {}\n", with_menus));
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report
}

/// Per-site report for standalone crawls, grouped the way results arrive.
pub fn generate_crawl_report(results: &[CrawlResult]) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let total_links: usize = results.iter().map(|r| r.menu_links.len()).sum();
    let total_pages: usize = results.iter().map(|r| r.pages_visited).sum();
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Sites crawled:    {}\n", results.len()));
    report.push_str(&format!("  Pages visited:    {}\n", total_pages));
    report.push_str(&format!("  Menu links found: {}\n\n", total_links));

    for result in results {
        let root = result
            .target
            .as_ref()
            .map(|t| t.root_url.as_str())
            .unwrap_or("(no website)");
        report.push_str(&format!(
            "## {}\n  {} pages visited, stopped: {:?}\n",
            root, result.pages_visited, result.stopped_reason
        ));
        for link in &result.menu_links {
            let marker = match link.kind {
                LinkKind::Page => "page",
                LinkKind::Pdf => "pdf ",
            };
            report.push_str(&format!("  [{}] {}\n", marker, link.url));
        }
        report.push('\n');
    }

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    fs::write(path, content)
}
