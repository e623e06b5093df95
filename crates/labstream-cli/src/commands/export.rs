use std::fs;
use std::io::Write;
use std::path::Path;

use labstream_core::{LogSink, default_channels};

pub fn run(channel: &str, data_dir: &str, out: Option<&str>) {
    if !Path::new(data_dir).exists() {
        eprintln!(
            "Data directory '{data_dir}' does not exist. Run `labstream backfill` or `labstream run` first."
        );
        std::process::exit(1);
    }

    let specs = default_channels();
    let sink = LogSink::open(data_dir, &specs);
    let bytes = match sink.export(channel) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error exporting '{channel}': {e}");
            std::process::exit(1);
        }
    };

    match out {
        Some(path) => match fs::write(path, &bytes) {
            Ok(()) => println!("Wrote {} bytes to {path}", bytes.len()),
            Err(e) => {
                eprintln!("Error writing '{path}': {e}");
                std::process::exit(1);
            }
        },
        None => {
            if std::io::stdout().write_all(&bytes).is_err() {
                std::process::exit(1);
            }
        }
    }
}
