use anyhow::bail;
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use menuhound::handlers;
use menuhound_core::collect::{self, CollectOptions};
use menuhound_core::places::{PlacesClient, PlacesConfig};
use menuhound_core::print_banner;
use menuhound_core::report;
use menuhound_core::score::{MenuScorer, WeightedScorer};
use menuhound_crawler::Crawler;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let outcome = match chosen_command.subcommand() {
        Some(("collect", primary_command)) => handle_collect(primary_command, quiet).await,
        Some(("crawl", primary_command)) => handle_crawl(primary_command).await,
        None => {
            // No subcommand provided, just show the banner
            return;
        }
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn handle_collect(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let api_key = handlers::api_key_from_env().map_err(anyhow::Error::msg)?;
    let max_places = *sub_matches.get_one::<usize>("max-places").unwrap_or(&50);
    let photos_per_place = *sub_matches.get_one::<usize>("photos-per-place").unwrap_or(&3);
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let outdir = handlers::resolve_outdir(
        sub_matches.get_one::<String>("outdir").map(String::as_str).unwrap_or("./out"),
    );

    let places_config =
        PlacesConfig { timeout_seconds: timeout, ..PlacesConfig::new(api_key) };
    let client = PlacesClient::new(places_config)?;

    let crawler = if sub_matches.get_flag("crawl-website") {
        Some(Crawler::new(handlers::crawl_config_from(sub_matches))?)
    } else {
        None
    };
    let scorer = if sub_matches.get_flag("detect-menus") {
        Some(WeightedScorer::default())
    } else {
        None
    };

    if !quiet {
        println!("Output directory: {}", outdir.display());
        println!("Max places: {}", max_places);
        println!(
            "Website crawling: {}",
            if crawler.is_some() { "enabled" } else { "disabled" }
        );
        println!(
            "Menu photo detection: {}\n",
            if scorer.is_some() { "enabled" } else { "disabled" }
        );
    }

    let summaries = if let Some(query) = sub_matches.get_one::<String>("text") {
        client.text_search(query, Some(max_places)).await?
    } else if sub_matches.get_flag("nearby") {
        let lat = *sub_matches.get_one::<f64>("lat").unwrap_or(&0.0);
        let lng = *sub_matches.get_one::<f64>("lng").unwrap_or(&0.0);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            bail!("--lat must be in [-90, 90] and --lng in [-180, 180]");
        }
        let radius = *sub_matches.get_one::<u32>("radius").unwrap_or(&1000);
        client.nearby_search(lat, lng, radius, Some(max_places)).await?
    } else {
        bail!("either --text or --nearby is required");
    };

    if summaries.is_empty() {
        println!("No places found.");
        return Ok(());
    }
    if !quiet {
        println!("Found {} places, enriching...\n", summaries.len());
    }

    // Ctrl-C finishes the restaurant in flight, then stops the run.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.store(true, Ordering::Relaxed);
        }
    });

    let options = CollectOptions {
        max_places,
        photos_per_place,
        outdir: outdir.clone(),
        show_progress_bar: !quiet,
        ..CollectOptions::default()
    };
    let scorer_ref: Option<&dyn MenuScorer> = scorer.as_ref().map(|s| s as &dyn MenuScorer);

    let outcome = collect::enrich_places(
        &client,
        crawler.as_ref(),
        scorer_ref,
        summaries,
        &options,
        Some(cancel),
    )
    .await;

    let json_path = outdir.join("places.json");
    let csv_path = outdir.join("places.csv");
    report::write_json(&outcome.records, &json_path)?;
    report::write_csv(&outcome.records, &csv_path)?;

    println!("{}", report::generate_run_summary(&outcome.records, &outcome.stats));
    println!("{} JSON output: {}", "✓".green(), json_path.display());
    println!("{} CSV output:  {}", "✓".green(), csv_path.display());

    Ok(())
}

async fn handle_crawl(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let urls = handlers::load_urls_from_source(url, hosts_file).map_err(anyhow::Error::msg)?;

    let crawler = Crawler::new(handlers::crawl_config_from(sub_matches))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut results = Vec::new();
    for (idx, site) in urls.iter().enumerate() {
        spinner.set_message(format!("Crawling {}/{}: {}", idx + 1, urls.len(), site));
        results.push(crawler.crawl(Some(site)).await);
    }
    let total_links: usize = results.iter().map(|r| r.menu_links.len()).sum();
    spinner.finish_with_message(format!(
        "Crawled {} site(s), {} menu links found",
        urls.len(),
        total_links
    ));

    let report_text = report::generate_crawl_report(&results);
    match sub_matches.get_one::<PathBuf>("output") {
        Some(path) => {
            report::save_report(&report_text, path)?;
            println!("{} Report saved to {}", "✓".green(), path.display());
        }
        None => print!("{}", report_text),
    }

    Ok(())
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
