use clap::ArgMatches;
use menuhound_crawler::CrawlConfig;
use menuhound_crawler::config::DEFAULT_USER_AGENT;
use std::fs;
use std::path::PathBuf;
use url::Url;

// Helper functions for the collect and crawl handlers

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a newline-delimited file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("https://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("[!] Skipping invalid URL '{}'", line);
    None
}

/// Expand `~` in a user-supplied output directory.
pub fn resolve_outdir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// The API key comes from the environment, never from an argument, so it
/// stays out of shell history.
pub fn api_key_from_env() -> Result<String, String> {
    std::env::var("GOOGLE_MAPS_API_KEY")
        .map_err(|_| "GOOGLE_MAPS_API_KEY is not set in the environment".to_string())
}

/// Assemble the crawler configuration from subcommand arguments.
pub fn crawl_config_from(matches: &ArgMatches) -> CrawlConfig {
    let defaults = CrawlConfig::default();
    CrawlConfig {
        max_pages_per_site: *matches
            .get_one::<usize>("max-pages")
            .unwrap_or(&defaults.max_pages_per_site),
        max_depth: *matches.get_one::<usize>("max-depth").unwrap_or(&defaults.max_depth),
        requests_per_second: *matches
            .get_one::<f64>("rate-limit")
            .unwrap_or(&defaults.requests_per_second),
        timeout_seconds: *matches
            .get_one::<u64>("timeout")
            .unwrap_or(&defaults.timeout_seconds),
        user_agent: matches
            .get_one::<String>("user-agent")
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        retry_count: *matches.get_one::<u32>("retries").unwrap_or(&defaults.retry_count),
    }
}
