use labstream_core::{
    TelemetryStore, backfill_history, format_iso8601_ms, synthetic_generator, truncate_to_minute,
    unix_ms_now,
};

pub fn run(channel: &str, tail: Option<usize>, json: bool, seed: u64) {
    let (specs, _) = super::make_channels(seed);
    let Some(spec) = specs.iter().find(|s| s.id == channel) else {
        eprintln!("Unknown channel '{channel}'. Try: labstream channels");
        std::process::exit(1);
    };
    let Some(generator) = synthetic_generator(&spec.id, seed) else {
        eprintln!("No synthetic generator for '{channel}'");
        std::process::exit(1);
    };

    // Generation and the window trim share the minute-aligned anchor.
    let now = truncate_to_minute(unix_ms_now());
    let store = TelemetryStore::new(specs.clone());
    let readings = backfill_history(spec, generator.as_ref(), now);
    if let Err(e) = store.load(&spec.id, readings, now) {
        eprintln!("Error building preview: {e}");
        std::process::exit(1);
    }

    let snapshot = match tail {
        Some(n) => store.snapshot_tail(&spec.id, n),
        None => store.snapshot(&spec.id),
    };
    let snapshot = match snapshot {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error taking snapshot: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error rendering JSON: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "{} preview ({} readings, seed {seed})",
        spec.id,
        snapshot.history.len()
    );
    println!();
    println!("  {:<22} {:>10}", "timestamp", spec.value_field);
    for reading in &snapshot.history {
        println!(
            "  {:<22} {:>10}",
            format_iso8601_ms(reading.timestamp),
            reading.value
        );
    }
    if let Some(latest) = snapshot.latest {
        println!();
        println!(
            "  latest: {} at {}",
            latest.value,
            format_iso8601_ms(latest.timestamp)
        );
    }
}
