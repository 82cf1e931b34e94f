//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed
//! arguments and returns an `anyhow::Result<()>`. Commands build the
//! service from the loaded config and drive it on a Tokio runtime.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::artwork::ImageResult;
use crate::config;
use crate::metrics::WrappedCounter;
use crate::service::RewindService;

/// Rewind.fm CLI - listening statistics and artwork from the terminal
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Show a user's top artists
    TopArtists {
        /// ListenBrainz username
        username: String,
        /// How many entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Show a user's top tracks
    TopTracks {
        /// ListenBrainz username
        username: String,
        /// How many entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Show a user's top albums
    TopAlbums {
        /// ListenBrainz username
        username: String,
        /// How many entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Resolve a user's dominant genre
    Genre {
        /// ListenBrainz username
        username: String,
    },
    /// Resolve the genre of a single artist
    ArtistGenre {
        /// Artist name
        name: String,
    },
    /// Estimate a user's total listen time in minutes
    ListenTime {
        /// ListenBrainz username
        username: String,
    },
    /// Fetch artwork for a user's top listening
    Image {
        /// ListenBrainz username
        username: String,
        /// Where to write the image
        #[arg(short, long, default_value = "artist-image.jpg")]
        output: PathBuf,
    },
    /// Show (or bump) the wrapped counter
    Count {
        /// Increment the counter instead of just reading it
        #[arg(long)]
        bump: bool,
    },
    /// Write a default config file if none exists
    InitConfig,
}

/// Execute a CLI command if one was specified.
///
/// Returns `Ok(true)` if a command was executed, `Ok(false)` if no
/// command was given (the caller prints usage).
pub fn run_command(args: &Cli) -> anyhow::Result<bool> {
    let Some(command) = &args.command else {
        return Ok(false);
    };

    let rt = Runtime::new()?;
    let cfg = config::load();

    match command {
        Commands::TopArtists { username, count } => {
            let service = RewindService::new(&cfg);
            let names = rt.block_on(service.top_artists(username, *count))?;
            print_ranked(&names);
        }
        Commands::TopTracks { username, count } => {
            let service = RewindService::new(&cfg);
            let names = rt.block_on(service.top_tracks(username, *count))?;
            print_ranked(&names);
        }
        Commands::TopAlbums { username, count } => {
            let service = RewindService::new(&cfg);
            let names = rt.block_on(service.top_albums(username, *count))?;
            print_ranked(&names);
        }
        Commands::Genre { username } => {
            let service = RewindService::new(&cfg);
            let genre = rt.block_on(service.top_genre(username))?;
            println!("{genre}");
        }
        Commands::ArtistGenre { name } => {
            let service = RewindService::new(&cfg);
            let genre = rt.block_on(service.genre_for_artist(name));
            println!("{genre}");
        }
        Commands::ListenTime { username } => {
            let service = RewindService::new(&cfg);
            let minutes = rt.block_on(service.estimate_listen_minutes(username))?;
            println!("{minutes} minutes");
        }
        Commands::Image { username, output } => {
            let service = RewindService::new(&cfg);
            let image = rt.block_on(service.fetch_artist_image(username))?;
            write_image(&image, output)?;
        }
        Commands::Count { bump } => {
            let counter =
                WrappedCounter::new(&cfg.metrics.count_file, cfg.metrics.count_since.as_str());
            let count = if *bump {
                counter.increment()?
            } else {
                counter.read()?
            };
            println!("{count} wrapped since {}", counter.since());
        }
        Commands::InitConfig => init_config()?,
    }
    Ok(true)
}

fn print_ranked(names: &[String]) {
    if names.is_empty() {
        println!("No entries found.");
        return;
    }
    for (index, name) in names.iter().enumerate() {
        println!("{}. {}", index + 1, name);
    }
}

fn write_image(image: &ImageResult, output: &PathBuf) -> anyhow::Result<()> {
    std::fs::write(output, &image.bytes)?;
    println!(
        "Wrote {} bytes ({}) to {:?} - {} ahead in queue at admission",
        image.bytes.len(),
        image.content_type,
        output,
        image.queue_position
    );
    Ok(())
}

fn init_config() -> anyhow::Result<()> {
    if let Some(path) = config::config_path()
        && path.exists()
    {
        println!("Config already exists at {path:?}");
        return Ok(());
    }
    config::save(&config::Config::default())?;
    if let Some(path) = config::config_path() {
        println!("Wrote default config to {path:?}");
    }
    Ok(())
}
