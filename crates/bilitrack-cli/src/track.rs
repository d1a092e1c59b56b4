//! Checkpoint tracking and labeling command handlers.
//!
//! These are called from `main` after the pool and config are established.
//! Each mutating run is bracketed by a `collect_runs` audit row so failed
//! sweeps leave a record.

use bilitrack_client::BiliClient;
use bilitrack_core::{AppConfig, CheckpointSchedule};
use bilitrack_tracker::{PgMetricsStore, Tracker};
use sqlx::PgPool;

/// Register an upload so checkpoint collection starts picking it up.
///
/// # Errors
///
/// Returns an error if `uploaded_at` is not valid RFC 3339 or the insert
/// fails.
pub(crate) async fn run_add(
    pool: &PgPool,
    video_id: &str,
    bvid: &str,
    channel_id: &str,
    uploaded_at: Option<&str>,
) -> anyhow::Result<()> {
    let uploaded_at = match uploaded_at {
        Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
            .map_err(|e| anyhow::anyhow!("invalid --uploaded-at '{raw}': {e}"))?
            .with_timezone(&chrono::Utc),
        None => chrono::Utc::now(),
    };

    if bilitrack_db::insert_upload(pool, video_id, channel_id, bvid, uploaded_at).await? {
        println!("tracking upload {video_id} ({bvid})");
    } else {
        println!("upload {video_id} is already tracked");
    }
    Ok(())
}

/// Collect snapshots for every due checkpoint (or a single age when
/// `checkpoint` is set).
///
/// # Errors
///
/// Returns an error if the client cannot be constructed, the audit row
/// cannot be written, or the sweep hits a storage failure.
pub(crate) async fn run_track(
    pool: &PgPool,
    config: &AppConfig,
    checkpoint: Option<i32>,
    json: bool,
) -> anyhow::Result<()> {
    let client = BiliClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build API client: {e}"))?;

    let mut tracker = Tracker::new(client, PgMetricsStore::new(pool.clone()));
    if let Some(age) = checkpoint {
        anyhow::ensure!(age > 0, "--checkpoint must be a positive hour count");
        tracker = tracker.with_schedule(CheckpointSchedule::new(vec![age]));
    }

    let run = bilitrack_db::create_run(pool, "track", "cli").await?;
    bilitrack_db::start_run(pool, run.id).await?;

    match tracker.run_due_checkpoints().await {
        Ok(report) => {
            let processed = i32::try_from(report.collected() + report.skipped).unwrap_or(i32::MAX);
            let failed = i32::try_from(report.failed).unwrap_or(i32::MAX);
            bilitrack_db::complete_run(pool, run.id, processed, failed).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                if report.by_checkpoint.is_empty() {
                    println!("no checkpoints due");
                }
                for (age, count) in &report.by_checkpoint {
                    println!("{age:>5}h: {count} snapshots");
                }
                println!(
                    "collected {} snapshots ({} skipped, {} failed)",
                    report.collected(),
                    report.skipped,
                    report.failed
                );
            }
            Ok(())
        }
        Err(e) => {
            bilitrack_db::fail_run(pool, run.id, &e.to_string()).await?;
            Err(e.into())
        }
    }
}

/// Label matured uploads. With `relabel` set, existing outcomes are
/// overwritten using the current thresholds.
///
/// # Errors
///
/// Returns an error if the audit row cannot be written or the sweep hits a
/// storage failure.
pub(crate) async fn run_label(
    pool: &PgPool,
    config: &AppConfig,
    min_checkpoint: Option<i32>,
    relabel: bool,
    json: bool,
) -> anyhow::Result<()> {
    let min_age = min_checkpoint.unwrap_or(config.min_label_checkpoint_hours);
    anyhow::ensure!(min_age > 0, "--min-checkpoint must be a positive hour count");

    let client = BiliClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build API client: {e}"))?;
    let tracker = Tracker::new(client, PgMetricsStore::new(pool.clone()));

    let run_type = if relabel { "relabel" } else { "label" };
    let run = bilitrack_db::create_run(pool, run_type, "cli").await?;
    bilitrack_db::start_run(pool, run.id).await?;

    let result = if relabel {
        tracker.run_relabeling(min_age).await
    } else {
        tracker.run_labeling(min_age).await
    };

    match result {
        Ok(report) => {
            let processed = i32::try_from(report.labeled()).unwrap_or(i32::MAX);
            bilitrack_db::complete_run(pool, run.id, processed, 0).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.labeled() == 0 {
                println!("no uploads eligible at >= {min_age}h");
            } else {
                for (label, count) in &report.by_label {
                    println!("{label:<12}{count}");
                }
                println!("labeled {} uploads", report.labeled());
            }
            Ok(())
        }
        Err(e) => {
            bilitrack_db::fail_run(pool, run.id, &e.to_string()).await?;
            Err(e.into())
        }
    }
}

/// Latest snapshot and outcome for one upload.
///
/// # Errors
///
/// Returns an error if the upload has no snapshots or a query fails.
pub(crate) async fn run_show(pool: &PgPool, video_id: &str, json: bool) -> anyhow::Result<()> {
    let latest = bilitrack_db::latest_performance(pool, video_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no snapshots recorded for upload '{video_id}'"))?;
    let outcome = bilitrack_db::get_outcome(pool, video_id).await?;

    if json {
        let value = serde_json::json!({
            "video_id": video_id,
            "checkpoint_hours": latest.checkpoint_hours,
            "recorded_at": latest.recorded_at.to_rfc3339(),
            "views": latest.views,
            "likes": latest.likes,
            "coins": latest.coins,
            "favorites": latest.favorites,
            "shares": latest.shares,
            "danmaku": latest.danmaku,
            "comments": latest.comments,
            "view_velocity": latest.view_velocity,
            "engagement_rate": latest.engagement_rate,
            "label": outcome.as_ref().map(|o| o.label.clone()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("upload {video_id} at {}h:", latest.checkpoint_hours);
    println!("  views:      {}", latest.views);
    println!("  likes:      {}", latest.likes);
    println!("  coins:      {}", latest.coins);
    println!("  favorites:  {}", latest.favorites);
    println!("  velocity:   {:.1} views/h", latest.view_velocity);
    println!("  engagement: {:.4}", latest.engagement_rate);
    match outcome {
        Some(o) => println!("  outcome:    {} (at {})", o.label, o.labeled_at.to_rfc3339()),
        None => println!("  outcome:    not labeled yet"),
    }
    Ok(())
}

/// Summary of tracked uploads, their latest-checkpoint averages, and label
/// distributions.
///
/// # Errors
///
/// Returns an error if a query fails.
pub(crate) async fn run_stats(pool: &PgPool, json: bool) -> anyhow::Result<()> {
    let uploads = bilitrack_db::list_uploads(pool).await?;
    let averages = bilitrack_db::latest_performance_averages(pool).await?;
    let outcomes = bilitrack_db::count_outcome_labels(pool).await?;
    let video_labels = bilitrack_db::count_channel_video_labels(pool).await?;
    let channels = bilitrack_db::list_channels(pool, false).await?;

    if json {
        let value = serde_json::json!({
            "uploads": uploads.len(),
            "channels": channels.len(),
            "avg_views": averages.avg_views,
            "avg_likes": averages.avg_likes,
            "avg_coins": averages.avg_coins,
            "avg_engagement_rate": averages.avg_engagement_rate,
            "outcomes": outcomes.iter().cloned().collect::<std::collections::BTreeMap<String, i64>>(),
            "channel_video_labels": video_labels.iter().cloned().collect::<std::collections::BTreeMap<String, i64>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("uploads tracked: {}", uploads.len());
    println!("channels:        {}", channels.len());
    println!();
    println!("latest-checkpoint averages:");
    println!("  views:      {:.0}", averages.avg_views);
    println!("  likes:      {:.0}", averages.avg_likes);
    println!("  coins:      {:.0}", averages.avg_coins);
    println!("  engagement: {:.4}", averages.avg_engagement_rate);

    if !outcomes.is_empty() {
        println!();
        println!("upload outcomes:");
        for (label, count) in &outcomes {
            println!("  {label:<12}{count}");
        }
    }
    if !video_labels.is_empty() {
        println!();
        println!("channel video labels:");
        for (label, count) in &video_labels {
            println!("  {label:<12}{count}");
        }
    }

    Ok(())
}
