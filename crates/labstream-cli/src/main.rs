//! CLI for labstream, a windowed telemetry store for lab sensor channels.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "labstream")]
#[command(about = "labstream, a windowed telemetry store for lab sensor channels")]
#[command(version = labstream_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full stack: warm-up, per-channel producers, HTTP server
    Run {
        /// Directory for the durable CSV logs
        #[arg(long, default_value = "data")]
        data_dir: String,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8044")]
        port: u16,

        /// Seed for the synthetic signal generators
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Regenerate history even when durable logs exist (discards them)
        #[arg(long)]
        fresh: bool,
    },

    /// Print the built-in channel table
    Channels,

    /// Write a full window of synthetic history per channel, then exit
    Backfill {
        /// Directory for the durable CSV logs
        #[arg(long, default_value = "data")]
        data_dir: String,

        /// Seed for the synthetic signal generators
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Regenerate history even when durable logs exist (discards them)
        #[arg(long)]
        fresh: bool,
    },

    /// Preview a channel's snapshot from an in-memory backfill (no disk I/O)
    Preview {
        /// Channel id (see `labstream channels`)
        channel: String,

        /// Only the last N readings
        #[arg(long)]
        tail: Option<usize>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Seed for the synthetic signal generators
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Dump a channel's durable CSV log
    Export {
        /// Channel id (see `labstream channels`)
        channel: String,

        /// Directory holding the durable CSV logs
        #[arg(long, default_value = "data")]
        data_dir: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data_dir,
            host,
            port,
            seed,
            fresh,
        } => commands::run::run(&data_dir, &host, port, seed, fresh),
        Commands::Channels => commands::channels::run(),
        Commands::Backfill {
            data_dir,
            seed,
            fresh,
        } => commands::backfill::run(&data_dir, seed, fresh),
        Commands::Preview {
            channel,
            tail,
            json,
            seed,
        } => commands::preview::run(&channel, tail, json, seed),
        Commands::Export {
            channel,
            data_dir,
            out,
        } => commands::export::run(&channel, &data_dir, out.as_deref()),
    }
}
