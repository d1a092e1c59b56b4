//! Channel monitoring command handlers.

use bilitrack_core::AppConfig;
use bilitrack_tracker::{ChannelMonitor, PgChannelStore, VideoLabeler};
use clap::Subcommand;
use sqlx::PgPool;

#[derive(Debug, Subcommand)]
pub(crate) enum ChannelsCommand {
    /// Seed the channel registry from the channels YAML file.
    Seed,
    /// Register a channel by uid and scan it once.
    Add {
        uid: String,
        /// How many recent videos to collect.
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// List registered channels.
    List {
        /// Include deactivated channels.
        #[arg(long)]
        all: bool,
    },
    /// Deactivate a channel.
    Remove { uid: String },
    /// Scan one channel for recent videos.
    Collect {
        uid: String,
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// Scan every active channel.
    CollectAll {
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// List collected channel videos, optionally filtered.
    Videos {
        /// Restrict to one channel uid.
        #[arg(long)]
        uid: Option<String>,
        /// Filter by label, or "unlabeled" for videos without one.
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Label channel videos that have no label yet.
    LabelVideos {
        #[arg(long, default_value_t = 1000)]
        limit: i64,
    },
    /// Re-label channel videos with the current thresholds.
    RelabelVideos {
        #[arg(long, default_value_t = 1000)]
        limit: i64,
    },
}

pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    command: ChannelsCommand,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        ChannelsCommand::Seed => run_seed(pool, config).await,
        ChannelsCommand::Add { uid, count } => run_collect(pool, config, &uid, count, json).await,
        ChannelsCommand::List { all } => run_list(pool, !all, json).await,
        ChannelsCommand::Remove { uid } => run_remove(pool, &uid).await,
        ChannelsCommand::Collect { uid, count } => {
            run_collect(pool, config, &uid, count, json).await
        }
        ChannelsCommand::CollectAll { count } => run_collect_all(pool, config, count, json).await,
        ChannelsCommand::Videos { uid, label, limit } => {
            run_videos(pool, uid.as_deref(), label.as_deref(), limit, json).await
        }
        ChannelsCommand::LabelVideos { limit } => run_label_videos(pool, limit, false, json).await,
        ChannelsCommand::RelabelVideos { limit } => {
            run_label_videos(pool, limit, true, json).await
        }
    }
}

async fn run_seed(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let file = bilitrack_core::load_channels(&config.channels_path)?;
    let seeded = bilitrack_db::seed_channels(pool, &file.channels).await?;
    println!(
        "seeded {seeded} channels from {}",
        config.channels_path.display()
    );
    Ok(())
}

async fn run_list(pool: &PgPool, active_only: bool, json: bool) -> anyhow::Result<()> {
    let channels = bilitrack_db::list_channels(pool, active_only).await?;

    if json {
        let value: Vec<serde_json::Value> = channels
            .iter()
            .map(|c| {
                serde_json::json!({
                    "uid": c.uid,
                    "name": c.name,
                    "follower_count": c.follower_count,
                    "video_count": c.video_count,
                    "is_active": c.is_active,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if channels.is_empty() {
        println!("no channels registered; run `channels seed` or `channels add <uid>`");
        return Ok(());
    }
    println!(
        "{:<14}{:<12}{:<10}{:<8}NAME",
        "UID", "FOLLOWERS", "VIDEOS", "ACTIVE"
    );
    for channel in &channels {
        println!(
            "{:<14}{:<12}{:<10}{:<8}{}",
            channel.uid,
            channel.follower_count,
            channel.video_count,
            if channel.is_active { "yes" } else { "no" },
            channel.name
        );
    }
    Ok(())
}

async fn run_remove(pool: &PgPool, uid: &str) -> anyhow::Result<()> {
    if bilitrack_db::deactivate_channel(pool, uid).await? {
        println!("deactivated channel {uid}");
    } else {
        anyhow::bail!("channel '{uid}' not found");
    }
    Ok(())
}

async fn run_collect(
    pool: &PgPool,
    config: &AppConfig,
    uid: &str,
    count: usize,
    json: bool,
) -> anyhow::Result<()> {
    let monitor = ChannelMonitor::new(PgChannelStore::new(pool.clone()), config.clone());

    let run = bilitrack_db::create_run(pool, "channel_scan", "cli").await?;
    bilitrack_db::start_run(pool, run.id).await?;

    match monitor.collect_channel(uid, count).await {
        Ok(scan) => {
            let processed = i32::try_from(scan.videos_recorded).unwrap_or(i32::MAX);
            let failed = i32::try_from(scan.videos_failed).unwrap_or(i32::MAX);
            if scan.videos_failed > 0 {
                tracing::warn!(
                    uid,
                    failed = scan.videos_failed,
                    "some video detail fetches failed during the scan"
                );
            }
            bilitrack_db::complete_run(pool, run.id, processed, failed).await?;
            print_scans(&[scan], json)
        }
        Err(e) => {
            bilitrack_db::fail_run(pool, run.id, &e.to_string()).await?;
            Err(e.into())
        }
    }
}

async fn run_collect_all(
    pool: &PgPool,
    config: &AppConfig,
    count: usize,
    json: bool,
) -> anyhow::Result<()> {
    let monitor = ChannelMonitor::new(PgChannelStore::new(pool.clone()), config.clone());

    let run = bilitrack_db::create_run(pool, "channel_scan_all", "cli").await?;
    bilitrack_db::start_run(pool, run.id).await?;

    match monitor.collect_all_active(count).await {
        Ok(scans) => {
            let recorded: u64 = scans.iter().map(|s| s.videos_recorded).sum();
            let fetch_failures: u64 = scans.iter().map(|s| s.videos_failed).sum();
            let processed = i32::try_from(recorded).unwrap_or(i32::MAX);
            let failed = i32::try_from(fetch_failures).unwrap_or(i32::MAX);
            if fetch_failures > 0 {
                tracing::warn!(
                    failed = fetch_failures,
                    "some video detail fetches failed during the sweep"
                );
            }
            bilitrack_db::complete_run(pool, run.id, processed, failed).await?;
            print_scans(&scans, json)
        }
        Err(e) => {
            bilitrack_db::fail_run(pool, run.id, &e.to_string()).await?;
            Err(e.into())
        }
    }
}

fn print_scans(scans: &[bilitrack_tracker::ChannelScan], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(scans)?);
        return Ok(());
    }
    for scan in scans {
        if scan.channel_found {
            println!(
                "{}: {} videos recorded ({} with YouTube source, {} gone, {} failed)",
                scan.uid,
                scan.videos_recorded,
                scan.with_source_id,
                scan.videos_gone,
                scan.videos_failed
            );
        } else {
            println!("{}: channel no longer exists, deactivated", scan.uid);
        }
    }
    Ok(())
}

async fn run_videos(
    pool: &PgPool,
    uid: Option<&str>,
    label: Option<&str>,
    limit: i64,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(label) = label {
        if label != "unlabeled" && label.parse::<bilitrack_core::OutcomeLabel>().is_err() {
            let valid: Vec<&str> = bilitrack_core::OutcomeLabel::ALL
                .iter()
                .map(|l| l.as_str())
                .collect();
            anyhow::bail!(
                "unknown label '{label}'; expected one of {} or 'unlabeled'",
                valid.join(", ")
            );
        }
    }

    let filter = bilitrack_db::ChannelVideoFilter { uid, label, limit };
    let videos = bilitrack_db::list_channel_videos(pool, &filter).await?;

    if json {
        let value: Vec<serde_json::Value> = videos
            .iter()
            .map(|v| {
                serde_json::json!({
                    "bvid": v.bvid,
                    "uid": v.uid,
                    "title": v.title,
                    "views": v.views,
                    "likes": v.likes,
                    "coins": v.coins,
                    "label": v.label,
                    "youtube_source_id": v.youtube_source_id,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if videos.is_empty() {
        println!("no channel videos match");
        return Ok(());
    }
    println!(
        "{:<14}{:<10}{:<10}{:<12}TITLE",
        "BVID", "VIEWS", "COINS", "LABEL"
    );
    for video in &videos {
        let title = if video.title.chars().count() > 50 {
            format!("{}...", video.title.chars().take(50).collect::<String>())
        } else {
            video.title.clone()
        };
        println!(
            "{:<14}{:<10}{:<10}{:<12}{}",
            video.bvid,
            video.views,
            video.coins,
            video.label.as_deref().unwrap_or("\u{2014}"),
            title
        );
    }
    Ok(())
}

async fn run_label_videos(
    pool: &PgPool,
    limit: i64,
    relabel: bool,
    json: bool,
) -> anyhow::Result<()> {
    let labeler = VideoLabeler::new(PgChannelStore::new(pool.clone()));
    let report = if relabel {
        labeler.relabel_all(limit).await?
    } else {
        labeler.label_unlabeled(limit).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.labeled() == 0 {
        println!("no channel videos to label");
        return Ok(());
    }
    for (label, count) in &report.by_label {
        println!("{label:<12}{count}");
    }
    if relabel {
        println!(
            "labeled {} videos ({} unchanged)",
            report.labeled(),
            report.unchanged
        );
    } else {
        println!("labeled {} videos", report.labeled());
    }

    let distribution = labeler.distribution().await?;
    if !distribution.is_empty() {
        println!();
        println!("distribution:");
        for (label, count) in &distribution {
            println!("  {label:<12}{count}");
        }
    }
    Ok(())
}
