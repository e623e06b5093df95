pub mod backfill;
pub mod channels;
pub mod export;
pub mod preview;
pub mod run;

use labstream_core::{ChannelSpec, ReadingGenerator, default_channels, synthetic_generator};

/// Build the built-in channel table and one seeded generator per channel.
///
/// Every channel ships with a synthetic generator; the pairing by id is what
/// the warm-up and producer layers consume.
pub fn make_channels(seed: u64) -> (Vec<ChannelSpec>, Vec<(String, Box<dyn ReadingGenerator>)>) {
    let specs = default_channels();
    let generators = specs
        .iter()
        .filter_map(|spec| synthetic_generator(&spec.id, seed).map(|g| (spec.id.clone(), g)))
        .collect();
    (specs, generators)
}
