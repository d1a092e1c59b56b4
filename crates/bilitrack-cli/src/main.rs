//! `bilitrack` command line interface.
//!
//! Checkpoint tracking commands live at the top level; channel monitoring
//! sits under `channels`. Every mutating command is wrapped in a
//! `collect_runs` audit row.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod channels;
#[cfg(test)]
mod tests;
mod track;

#[derive(Debug, Parser)]
#[command(name = "bilitrack")]
#[command(about = "Video performance tracking and outcome classification")]
struct Cli {
    /// Emit machine-readable JSON instead of text output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Verify database connectivity.
    Ping,
    /// Register an upload for checkpoint tracking.
    Add {
        /// Internal video id from the publishing pipeline.
        video_id: String,
        /// Bilibili bvid the upload was published under.
        bvid: String,
        #[arg(long)]
        channel: String,
        /// Publish time (RFC 3339); defaults to now.
        #[arg(long)]
        uploaded_at: Option<String>,
    },
    /// Collect metric snapshots for every due checkpoint.
    Track {
        /// Collect a single checkpoint age instead of the full schedule.
        #[arg(long)]
        checkpoint: Option<i32>,
    },
    /// Label matured uploads that have no outcome yet.
    Label {
        /// Minimum checkpoint age (hours) an upload must have reached.
        #[arg(long)]
        min_checkpoint: Option<i32>,
    },
    /// Re-label every matured upload with the current thresholds.
    Relabel {
        #[arg(long)]
        min_checkpoint: Option<i32>,
    },
    /// Latest snapshot and outcome for one tracked upload.
    Show { video_id: String },
    /// Summary of tracked uploads, outcomes, and channel videos.
    Stats,
    /// Channel monitoring commands.
    #[command(subcommand)]
    Channels(channels::ChannelsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = bilitrack_core::load_app_config_from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    let pool = bilitrack_db::connect_pool(
        &config.database_url,
        bilitrack_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::Migrate => {
            let applied = bilitrack_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
        }
        Commands::Ping => {
            bilitrack_db::ping(&pool).await?;
            println!("database ok");
        }
        Commands::Add {
            video_id,
            bvid,
            channel,
            uploaded_at,
        } => {
            track::run_add(&pool, &video_id, &bvid, &channel, uploaded_at.as_deref()).await?;
        }
        Commands::Track { checkpoint } => {
            track::run_track(&pool, &config, checkpoint, cli.json).await?;
        }
        Commands::Label { min_checkpoint } => {
            track::run_label(&pool, &config, min_checkpoint, false, cli.json).await?;
        }
        Commands::Relabel { min_checkpoint } => {
            track::run_label(&pool, &config, min_checkpoint, true, cli.json).await?;
        }
        Commands::Show { video_id } => {
            track::run_show(&pool, &video_id, cli.json).await?;
        }
        Commands::Stats => {
            track::run_stats(&pool, cli.json).await?;
        }
        Commands::Channels(command) => {
            channels::run(&pool, &config, command, cli.json).await?;
        }
    }

    Ok(())
}
