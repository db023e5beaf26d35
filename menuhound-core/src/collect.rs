//! The per-restaurant enrichment loop: details, photos, menu crawl.

use crate::place::{PlaceRecord, PlaceSummary};
use crate::places::{PlacesClient, PlacesError};
use crate::score::{MenuScorer, PhotoSignals};
use indicatif::{ProgressBar, ProgressStyle};
use menuhound_crawler::{Crawler, StopReason};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Options for one collection run.
pub struct CollectOptions {
    pub max_places: usize,
    /// 0 downloads every photo the API lists.
    pub photos_per_place: usize,
    pub photo_max_width: u32,
    pub outdir: PathBuf,
    pub show_progress_bar: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_places: 50,
            photos_per_place: 3,
            photo_max_width: 1600,
            outdir: PathBuf::from("./out"),
            show_progress_bar: true,
        }
    }
}

/// Set from a signal handler to stop the run between restaurants. The
/// restaurant in flight always completes.
pub type CancelFlag = Arc<AtomicBool>;

#[derive(Debug, Default, Clone, Serialize)]
pub struct CollectStats {
    pub places_processed: usize,
    pub places_failed: usize,
    pub photos_downloaded: usize,
    pub menu_photos_flagged: usize,
    pub menu_urls_found: usize,
    pub sites_without_website: usize,
    pub cancelled: bool,
}

pub struct CollectOutcome {
    pub records: Vec<PlaceRecord>,
    pub stats: CollectStats,
}

/// Enrich search results one restaurant at a time. Per-restaurant failures
/// are logged and absorbed; a single broken place never fails the run.
pub async fn enrich_places(
    client: &PlacesClient,
    crawler: Option<&Crawler>,
    scorer: Option<&dyn MenuScorer>,
    mut summaries: Vec<PlaceSummary>,
    options: &CollectOptions,
    cancel: Option<CancelFlag>,
) -> CollectOutcome {
    // Deterministic processing order, independent of API result order.
    summaries.sort_by(|a, b| a.place_id.cmp(&b.place_id));
    summaries.truncate(options.max_places);

    let progress_bar = if options.show_progress_bar {
        let pb = ProgressBar::new(summaries.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut records = Vec::new();
    let mut stats = CollectStats::default();

    for summary in summaries {
        if let Some(ref flag) = cancel
            && flag.load(Ordering::Relaxed)
        {
            info!("Collection cancelled; stopping before {}", summary.place_id);
            stats.cancelled = true;
            break;
        }

        if let Some(ref pb) = progress_bar {
            pb.set_message(summary.name.clone());
        }

        match enrich_one(client, crawler, scorer, &summary, options).await {
            Ok(Some(record)) => {
                stats.places_processed += 1;
                stats.photos_downloaded += record.photo_local_paths.len();
                stats.menu_photos_flagged += record.menu_photo_paths.len();
                stats.menu_urls_found += record.menu_urls.len();
                if crawler.is_some() && record.website.is_none() {
                    stats.sites_without_website += 1;
                }
                records.push(record);
            }
            Ok(None) => {
                stats.places_failed += 1;
            }
            Err(e) => {
                warn!("Failed to enrich {}: {}", summary.name, e);
                stats.places_failed += 1;
            }
        }

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("{} places enriched", stats.places_processed));
    }

    CollectOutcome { records, stats }
}

async fn enrich_one(
    client: &PlacesClient,
    crawler: Option<&Crawler>,
    scorer: Option<&dyn MenuScorer>,
    summary: &PlaceSummary,
    options: &CollectOptions,
) -> Result<Option<PlaceRecord>, PlacesError> {
    let Some(details) = client.place_details(&summary.place_id).await? else {
        return Ok(None);
    };
    let mut record = PlaceRecord::from_details(&details);

    let folder_name = if record.name.is_empty() {
        record.place_id.clone()
    } else {
        sanitize_folder_name(&record.name)
    };
    let restaurant_dir = options.outdir.join(&folder_name);
    let photos_dir = restaurant_dir.join("photos").join("photos");
    let menus_dir = restaurant_dir.join("photos").join("menus");

    let photo_count = if options.photos_per_place == 0 {
        details.photos.len()
    } else {
        details.photos.len().min(options.photos_per_place)
    };

    if photo_count > 0 {
        tokio::fs::create_dir_all(&photos_dir).await?;
        if scorer.is_some() {
            tokio::fs::create_dir_all(&menus_dir).await?;
        }
    }

    for (i, photo) in details.photos.iter().take(photo_count).enumerate() {
        let filename = format!("{}_{}.jpg", record.place_id, i);
        let dest = photos_dir.join(&filename);

        let byte_size = match client
            .download_photo(&photo.photo_reference, options.photo_max_width, &dest)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Photo download failed for {}: {}", record.place_id, e);
                continue;
            }
        };
        record
            .photo_local_paths
            .push(format!("{folder_name}/photos/photos/{filename}"));

        if let Some(scorer) = scorer {
            let signals = PhotoSignals { aspect_ratio: photo.aspect_ratio(), byte_size };
            if scorer.is_menu(&signals) {
                tokio::fs::copy(&dest, menus_dir.join(&filename)).await?;
                record
                    .menu_photo_paths
                    .push(format!("{folder_name}/photos/menus/{filename}"));
            }
        }
    }

    if let Some(crawler) = crawler {
        let crawl = crawler.crawl(record.website.as_deref()).await;
        if crawl.stopped_reason == StopReason::Error {
            warn!("Menu crawl errored for {}", record.name);
        }
        record.menu_urls = crawl.menu_urls();
    }

    let info_dir = restaurant_dir.join("information");
    tokio::fs::create_dir_all(&info_dir).await?;
    crate::report::write_json(std::slice::from_ref(&record), &info_dir.join("data.json"))
        .map_err(std::io::Error::other)?;

    Ok(Some(record))
}

/// Make a restaurant name safe to use as a directory name.
pub fn sanitize_folder_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.chars() {
        match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => {}
            c if c.is_whitespace() || c == '-' => {
                if !last_was_sep {
                    out.push('_');
                    last_was_sep = true;
                }
            }
            c => {
                out.push(c);
                last_was_sep = false;
            }
        }
    }

    let trimmed: String = out.trim_matches(['_', '.']).chars().take(100).collect();
    if trimmed.is_empty() { "unknown".to_string() } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_folder_name("Chez Marcel"), "Chez_Marcel");
    }

    #[test]
    fn test_sanitize_strips_invalid_characters() {
        assert_eq!(sanitize_folder_name("Fish & Chips: \"The Best\"?"), "Fish_&_Chips_The_Best");
    }

    #[test]
    fn test_sanitize_collapses_separators() {
        assert_eq!(sanitize_folder_name("La - Petite   Table"), "La_Petite_Table");
    }

    #[test]
    fn test_sanitize_empty_name() {
        assert_eq!(sanitize_folder_name(""), "unknown");
        assert_eq!(sanitize_folder_name("???"), "unknown");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_folder_name(&long).len(), 100);
    }
}
