//! End-to-end tracker tests against a mocked API and an in-memory store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bilitrack_client::{BiliClient, RetryPolicy};
use bilitrack_core::CheckpointSchedule;
use bilitrack_db::{
    DbError, NewOutcome, NewPerformance, OutcomeRow, PerformanceRow, UploadRow,
};
use bilitrack_tracker::{MetricsStore, Tracker};
use chrono::Utc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory [`MetricsStore`] mirroring the Postgres queries.
#[derive(Clone, Default)]
struct MemStore {
    inner: Arc<Mutex<MemState>>,
}

#[derive(Default)]
struct MemState {
    uploads: Vec<UploadRow>,
    performance: Vec<PerformanceRow>,
    outcomes: Vec<OutcomeRow>,
}

impl MemStore {
    fn add_upload(&self, video_id: &str, bvid: &str, hours_old: i64) {
        let now = Utc::now();
        self.inner.lock().unwrap().uploads.push(UploadRow {
            video_id: video_id.to_owned(),
            channel_id: "100".to_owned(),
            bvid: bvid.to_owned(),
            uploaded_at: now - chrono::Duration::hours(hours_old),
            created_at: now,
        });
    }

    fn performance_rows(&self, upload_id: &str) -> Vec<PerformanceRow> {
        self.inner
            .lock()
            .unwrap()
            .performance
            .iter()
            .filter(|p| p.upload_id == upload_id)
            .cloned()
            .collect()
    }

    fn outcome(&self, upload_id: &str) -> Option<OutcomeRow> {
        self.inner
            .lock()
            .unwrap()
            .outcomes
            .iter()
            .find(|o| o.upload_id == upload_id)
            .cloned()
    }
}

impl MetricsStore for MemStore {
    async fn due_for_checkpoint(&self, age_hours: i32) -> Result<Vec<UploadRow>, DbError> {
        let state = self.inner.lock().unwrap();
        let now = Utc::now();
        Ok(state
            .uploads
            .iter()
            .filter(|u| {
                let matured =
                    u.uploaded_at + chrono::Duration::hours(i64::from(age_hours)) <= now;
                let already = state
                    .performance
                    .iter()
                    .any(|p| p.upload_id == u.video_id && p.checkpoint_hours == age_hours);
                matured && !already
            })
            .cloned()
            .collect())
    }

    async fn upsert_performance(&self, row: &NewPerformance<'_>) -> Result<i64, DbError> {
        let mut state = self.inner.lock().unwrap();
        let id = state.performance.len() as i64 + 1;
        state
            .performance
            .retain(|p| !(p.upload_id == row.upload_id && p.checkpoint_hours == row.checkpoint_hours));
        state.performance.push(PerformanceRow {
            id,
            upload_id: row.upload_id.to_owned(),
            checkpoint_hours: row.checkpoint_hours,
            recorded_at: row.recorded_at,
            views: row.views,
            likes: row.likes,
            coins: row.coins,
            favorites: row.favorites,
            shares: row.shares,
            danmaku: row.danmaku,
            comments: row.comments,
            view_velocity: row.view_velocity,
            engagement_rate: row.engagement_rate,
        });
        Ok(id)
    }

    async fn latest_performance(
        &self,
        upload_id: &str,
    ) -> Result<Option<PerformanceRow>, DbError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .performance
            .iter()
            .filter(|p| p.upload_id == upload_id)
            .max_by_key(|p| p.checkpoint_hours)
            .cloned())
    }

    async fn eligible_for_label(&self, min_age_hours: i32) -> Result<Vec<UploadRow>, DbError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .uploads
            .iter()
            .filter(|u| {
                let matured = state
                    .performance
                    .iter()
                    .any(|p| p.upload_id == u.video_id && p.checkpoint_hours >= min_age_hours);
                let labeled = state.outcomes.iter().any(|o| o.upload_id == u.video_id);
                matured && !labeled
            })
            .cloned()
            .collect())
    }

    async fn eligible_for_relabel(&self, min_age_hours: i32) -> Result<Vec<UploadRow>, DbError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .uploads
            .iter()
            .filter(|u| {
                state
                    .performance
                    .iter()
                    .any(|p| p.upload_id == u.video_id && p.checkpoint_hours >= min_age_hours)
            })
            .cloned()
            .collect())
    }

    async fn upsert_outcome(&self, outcome: &NewOutcome<'_>) -> Result<i64, DbError> {
        let mut state = self.inner.lock().unwrap();
        let id = state.outcomes.len() as i64 + 1;
        state.outcomes.retain(|o| o.upload_id != outcome.upload_id);
        state.outcomes.push(OutcomeRow {
            id,
            upload_id: outcome.upload_id.to_owned(),
            label: outcome.label.to_owned(),
            labeled_at: outcome.labeled_at,
            final_views: outcome.final_views,
            final_engagement_rate: outcome.final_engagement_rate,
            final_coins: outcome.final_coins,
        });
        Ok(id)
    }
}

fn test_client(base_url: &str, max_retries: u32) -> BiliClient {
    let retry = RetryPolicy {
        max_retries,
        throttle_backoff_base_secs: 0,
        error_backoff_base_secs: 0,
    };
    BiliClient::with_base_url(30, "bilitrack-test/0.1", Duration::ZERO, retry, base_url)
        .expect("client construction should not fail")
}

fn stats_body(bvid: &str, views: i64, likes: i64, coins: i64, favorites: i64) -> serde_json::Value {
    serde_json::json!({
        "code": 0,
        "message": "0",
        "data": {
            "bvid": bvid,
            "title": "demo",
            "desc": "",
            "duration": 300,
            "pubdate": 1_700_000_000,
            "stat": {
                "view": views,
                "like": likes,
                "coin": coins,
                "favorite": favorites,
                "share": 5,
                "danmaku": 2,
                "reply": 7
            }
        }
    })
}

async fn mock_stats(server: &MockServer, bvid: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .and(query_param("bvid", bvid))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sweep_collects_every_matured_checkpoint_once() {
    let server = MockServer::start().await;
    mock_stats(&server, "BV1demo", stats_body("BV1demo", 48_000, 600, 200, 400)).await;

    let store = MemStore::default();
    store.add_upload("vid-1", "BV1demo", 200);

    let tracker = Tracker::new(test_client(&server.uri(), 0), store.clone());
    let report = tracker.run_due_checkpoints().await.unwrap();

    // 200 hours old: 1/6/24/48/168 are due, 720 is not.
    let ages: Vec<i32> = report.by_checkpoint.keys().copied().collect();
    assert_eq!(ages, vec![1, 6, 24, 48, 168]);
    assert_eq!(report.collected(), 5);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);

    let rows = store.performance_rows("vid-1");
    assert_eq!(rows.len(), 5);
    let at_24 = rows.iter().find(|p| p.checkpoint_hours == 24).unwrap();
    assert!((at_24.view_velocity - 2000.0).abs() < f64::EPSILON);
    assert!((at_24.engagement_rate - 0.025).abs() < 1e-9);

    // A second sweep finds nothing due.
    let again = tracker.run_due_checkpoints().await.unwrap();
    assert_eq!(again.collected(), 0);
}

#[tokio::test]
async fn gone_video_is_skipped_without_writing() {
    let server = MockServer::start().await;
    let gone = serde_json::json!({ "code": -404, "message": "not found", "data": null });
    mock_stats(&server, "BV1gone", gone).await;

    let store = MemStore::default();
    store.add_upload("vid-gone", "BV1gone", 48);

    let tracker = Tracker::new(test_client(&server.uri(), 0), store.clone())
        .with_schedule(CheckpointSchedule::new(vec![1, 6, 24]));
    let report = tracker.run_due_checkpoints().await.unwrap();

    assert_eq!(report.collected(), 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.failed, 0);
    assert!(store.performance_rows("vid-gone").is_empty());
}

#[tokio::test]
async fn throttle_exhaustion_is_isolated_per_upload() {
    let server = MockServer::start().await;
    mock_stats(&server, "BV1ok", stats_body("BV1ok", 1000, 10, 5, 5)).await;
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .and(query_param("bvid", "BV1hot"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let store = MemStore::default();
    store.add_upload("vid-ok", "BV1ok", 10);
    store.add_upload("vid-hot", "BV1hot", 10);

    let tracker = Tracker::new(test_client(&server.uri(), 1), store.clone())
        .with_schedule(CheckpointSchedule::new(vec![1]));
    let report = tracker.run_due_checkpoints().await.unwrap();

    assert_eq!(report.collected(), 1);
    assert_eq!(report.failed, 1);
    assert_eq!(store.performance_rows("vid-ok").len(), 1);
    assert!(store.performance_rows("vid-hot").is_empty());
}

#[tokio::test]
async fn labeling_classifies_latest_snapshot() {
    let server = MockServer::start().await;
    // 1200/50000 = 0.024 engagement: standard tier.
    mock_stats(&server, "BV1std", stats_body("BV1std", 50_000, 600, 200, 400)).await;

    let store = MemStore::default();
    store.add_upload("vid-std", "BV1std", 200);

    let tracker = Tracker::new(test_client(&server.uri(), 0), store.clone());
    tracker.run_due_checkpoints().await.unwrap();

    let report = tracker.run_labeling(168).await.unwrap();
    assert_eq!(report.labeled(), 1);
    assert_eq!(report.by_label.get("standard"), Some(&1));

    let outcome = store.outcome("vid-std").unwrap();
    assert_eq!(outcome.label, "standard");
    assert_eq!(outcome.final_views, 50_000);
    assert_eq!(outcome.final_coins, 200);

    // Already labeled: a second pass finds nothing eligible.
    let again = tracker.run_labeling(168).await.unwrap();
    assert_eq!(again.labeled(), 0);
}

#[tokio::test]
async fn labeling_requires_a_matured_checkpoint() {
    let server = MockServer::start().await;
    mock_stats(&server, "BV1new", stats_body("BV1new", 5_000, 100, 50, 50)).await;

    let store = MemStore::default();
    store.add_upload("vid-new", "BV1new", 30);

    let tracker = Tracker::new(test_client(&server.uri(), 0), store.clone());
    tracker.run_due_checkpoints().await.unwrap();

    // Only 1/6/24 hour snapshots exist, none at >= 168.
    let report = tracker.run_labeling(168).await.unwrap();
    assert_eq!(report.labeled(), 0);
    assert!(store.outcome("vid-new").is_none());
}

#[tokio::test]
async fn relabeling_overwrites_existing_outcomes() {
    let server = MockServer::start().await;
    // 120k/2M = 0.06 engagement, 30k coins: viral.
    mock_stats(
        &server,
        "BV1big",
        stats_body("BV1big", 2_000_000, 60_000, 30_000, 30_000),
    )
    .await;

    let store = MemStore::default();
    store.add_upload("vid-big", "BV1big", 200);

    let tracker = Tracker::new(test_client(&server.uri(), 0), store.clone());
    tracker.run_due_checkpoints().await.unwrap();
    tracker.run_labeling(168).await.unwrap();
    assert_eq!(store.outcome("vid-big").unwrap().label, "viral");

    // Tighten the viral bar so the same numbers land in successful.
    let strict = bilitrack_core::LabelThresholds {
        viral_min_views: 10_000_000,
        ..bilitrack_core::LabelThresholds::default()
    };
    let tracker = Tracker::new(test_client(&server.uri(), 0), store.clone())
        .with_thresholds(strict);
    let report = tracker.run_relabeling(168).await.unwrap();

    assert_eq!(report.labeled(), 1);
    assert_eq!(store.outcome("vid-big").unwrap().label, "successful");
}
