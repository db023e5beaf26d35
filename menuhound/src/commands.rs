use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("menuhound")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("menuhound")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
        .subcommand_required(false)
        .subcommand(with_crawler_args(
            command!("collect")
                .about(
                    "Search the Places API for restaurants and enrich them with photos and \
                menu links.",
                )
                .arg(
                    arg!(-t --"text" <QUERY>)
                        .required(false)
                        .help("Text search query, e.g. \"restaurants in Paris\"")
                        .conflicts_with("nearby"),
                )
                .arg(
                    arg!(--"nearby")
                        .required(false)
                        .help("Nearby search around --lat/--lng")
                        .action(clap::ArgAction::SetTrue)
                        .requires("lat")
                        .requires("lng"),
                )
                .arg(
                    arg!(--"lat" <LAT>)
                        .required(false)
                        .help("Latitude for nearby search")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"lng" <LNG>)
                        .required(false)
                        .help("Longitude for nearby search")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"radius" <METERS>)
                        .required(false)
                        .help("Search radius in meters for nearby search")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("1000"),
                )
                .arg(
                    arg!(--"max-places" <N>)
                        .required(false)
                        .help("Maximum number of places to process")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(--"photos-per-place" <N>)
                        .required(false)
                        .help("Photos to download per place (0 = all available)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"detect-menus")
                        .required(false)
                        .help("Flag menu-looking photos into a menus folder")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"crawl-website")
                        .required(false)
                        .help("Crawl each restaurant's website for menu URLs")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"outdir" <PATH>)
                        .required(false)
                        .help("Output directory")
                        .default_value("./out"),
                ),
        ))
        .subcommand(with_crawler_args(
            command!("crawl")
                .about(
                    "Crawl a site (or file of sites) for menu links, without touching the \
                Places API.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The site to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to crawl")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        ))
}

/// Crawler knobs shared by both subcommands.
fn with_crawler_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(--"max-pages" <N>)
            .required(false)
            .help("Page cap per site")
            .value_parser(clap::value_parser!(usize))
            .default_value("20"),
    )
    .arg(
        arg!(--"max-depth" <N>)
            .required(false)
            .help("Maximum link depth from the site root")
            .value_parser(clap::value_parser!(usize))
            .default_value("2"),
    )
    .arg(
        arg!(--"rate-limit" <QPS>)
            .required(false)
            .help("Politeness limit in requests per second, per site")
            .value_parser(clap::value_parser!(f64))
            .default_value("8.0"),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Per-request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("10"),
    )
    .arg(
        arg!(--"user-agent" <STRING>)
            .required(false)
            .help("User agent sent on every request"),
    )
    .arg(
        arg!(--"retries" <N>)
            .required(false)
            .help("Retries for timeouts and 5xx responses")
            .value_parser(clap::value_parser!(u32))
            .default_value("2"),
    )
}
