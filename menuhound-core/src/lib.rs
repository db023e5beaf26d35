pub mod collect;
pub mod place;
pub mod places;
pub mod report;
pub mod score;

pub use collect::{CollectOptions, CollectOutcome, CollectStats, enrich_places};
pub use place::{PlaceDetails, PlaceRecord, PlaceSummary};
pub use places::{PlacesClient, PlacesConfig, PlacesError};
pub use score::{MenuScorer, PhotoSignals, ScoreWeights, WeightedScorer};

/// Printed at startup unless --quiet is set.
pub fn print_banner() {
    println!(
        r#"
                             _                           _
  _ __ ___   ___ _ __  _   _| |__   ___  _   _ _ __   __| |
 | '_ ` _ \ / _ \ '_ \| | | | '_ \ / _ \| | | | '_ \ / _` |
 | | | | | |  __/ | | | |_| | | | | (_) | |_| | | | | (_| |
 |_| |_| |_|\___|_| |_|\__,_|_| |_|\___/ \__,_|_| |_|\__,_|
"#
    );
    println!(" menuhound v{} - restaurant menu discovery\n", env!("CARGO_PKG_VERSION"));
}
