use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use crate::config;
use crate::domain::order::apply_preferred_order;
use crate::http::server::HttpServer;
use crate::storage::{manifest, source};

#[derive(Parser)]
#[command(name = "trackshelf")]
#[command(version = "0.1")]
#[command(about = "Audio track manifest builder and streaming server")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the track manifest and extract embedded artwork
    Manifest,
    /// Run http server hosting the tracks
    Serve,
    /// List tracks in playback order
    List {
        /// Keep the order the track source returns
        #[arg(short, long)]
        unordered: bool,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cfg = config::Config::load(&cli.config)?;

    match &cli.command {
        Commands::Manifest => {
            let report = manifest::build(&cfg.library, &cfg.manifest)
                .with_context(|| "Failed to generate audio manifest")?;

            println!(
                "Generated audio manifest with {} tracks at {}",
                report.tracks.len(),
                report.path.to_string_lossy()
            );
            println!("Extracted artwork for {} tracks", report.artwork_written);
        }

        Commands::Serve => {
            let source = source::open(cfg.source.kind, &cfg.library, &cfg.manifest)
                .with_context(|| "Failed to open track source")?;

            let http_server = HttpServer::new(source, cfg);

            info!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }

        Commands::List { unordered } => {
            let source = source::open(cfg.source.kind, &cfg.library, &cfg.manifest)
                .with_context(|| "Failed to open track source")?;

            let mut tracks = source.list_tracks()?;
            if !*unordered {
                tracks = apply_preferred_order(tracks, &cfg.order.preferred);
            }

            for (i, track) in tracks.iter().enumerate() {
                println!("{:>3}. {} - {}", i + 1, track.artist, track.title);
                println!("     src: {}", track.src);
                if let Some(artwork) = &track.artwork {
                    println!("     artwork: {}", artwork);
                }
            }
        }
    }

    Ok(())
}
