use labstream_core::{LogSink, TelemetryStore, WarmStart, unix_ms_now, warm};

pub fn run(data_dir: &str, seed: u64, fresh: bool) {
    let (specs, generators) = super::make_channels(seed);
    let store = TelemetryStore::new(specs.clone());
    let sink = match LogSink::new(data_dir, &specs) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error creating data directory '{data_dir}': {e}");
            std::process::exit(1);
        }
    };

    let mode = if fresh { WarmStart::Fresh } else { WarmStart::Replay };
    let reports = warm(&store, &sink, &generators, mode, unix_ms_now());

    println!("Backfill into {}", sink.dir().display());
    for report in &reports {
        let how = if report.replayed { "replayed" } else { "synthesized" };
        println!(
            "  {:<13} {:>6} readings ({how})",
            report.channel, report.readings
        );
    }
}
