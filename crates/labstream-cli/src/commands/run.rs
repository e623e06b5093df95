use std::sync::Arc;

use labstream_core::{LogSink, TelemetryStore, WarmStart, spawn_producers, unix_ms_now, warm};
use tokio::sync::watch;

pub fn run(data_dir: &str, host: &str, port: u16, seed: u64, fresh: bool) {
    let (specs, generators) = super::make_channels(seed);
    let store = Arc::new(TelemetryStore::new(specs.clone()));
    let sink = match LogSink::new(data_dir, &specs) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Error creating data directory '{data_dir}': {e}");
            std::process::exit(1);
        }
    };

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let mode = if fresh { WarmStart::Fresh } else { WarmStart::Replay };
        let reports = warm(&store, &sink, &generators, mode, unix_ms_now());

        println!("Labstream v{}", labstream_core::VERSION);
        println!("  Data dir:  {}", sink.dir().display());
        for report in &reports {
            let how = if report.replayed { "replayed" } else { "synthesized" };
            println!(
                "  {:<12} {:>6} readings ({how})",
                report.channel, report.readings
            );
        }
        println!();
        println!("  http://{host}:{port}");
        println!("    GET /channels                   channel table");
        println!("    GET /channels/{{channel}}         snapshot (?tail=N)");
        println!("    GET /channels/{{channel}}/export  full CSV log");
        println!();
        println!("  Ctrl+C to stop");
        println!();

        let (tx, rx) = watch::channel(false);
        let handles = spawn_producers(&store, &sink, generators, &rx);

        let mut shutdown = rx.clone();
        ctrlc::set_handler(move || {
            let _ = tx.send(true);
        })
        .expect("Error setting Ctrl+C handler");

        tokio::select! {
            _ = labstream_server::run_server(Arc::clone(&store), Arc::clone(&sink), host, port) => {}
            _ = wait_for_shutdown(&mut shutdown) => {}
        }

        for handle in handles {
            let _ = handle.await;
        }
        println!("Stopped. Logs are in {}", sink.dir().display());
    });
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}
