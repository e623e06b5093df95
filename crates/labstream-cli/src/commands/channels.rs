use labstream_core::{default_channels, format_duration_short};

pub fn run() {
    let channels = default_channels();

    println!("Built-in channels:\n");
    println!(
        "  {:<13} {:<14} {:>8} {:>8} {:>10}",
        "id", "value_field", "window", "period", "backfill"
    );
    for spec in &channels {
        println!(
            "  {:<13} {:<14} {:>8} {:>8} {:>10}",
            spec.id,
            spec.value_field,
            format_duration_short(spec.retention_window),
            format_duration_short(spec.production_period),
            spec.backfill_len(),
        );
    }
    println!();
    println!("  window:   in-memory retention; the CSV log keeps the full record");
    println!("  backfill: readings synthesized to fill the window on first start");
}
