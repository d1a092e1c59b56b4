//! Integration tests for `BiliClient` using wiremock HTTP mocks.

use std::time::Duration;

use bilitrack_client::{BiliClient, ClientError, RetryPolicy};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> BiliClient {
    test_client_with_retries(base_url, 0)
}

fn test_client_with_retries(base_url: &str, max_retries: u32) -> BiliClient {
    let retry = RetryPolicy {
        max_retries,
        throttle_backoff_base_secs: 0,
        error_backoff_base_secs: 0,
    };
    BiliClient::with_base_url(30, "bilitrack-test/0.1", Duration::ZERO, retry, base_url)
        .expect("client construction should not fail")
}

fn video_body(bvid: &str, views: i64) -> serde_json::Value {
    serde_json::json!({
        "code": 0,
        "message": "0",
        "data": {
            "bvid": bvid,
            "title": "demo video",
            "desc": "a description",
            "duration": 300,
            "pubdate": 1_700_000_000,
            "stat": {
                "view": views,
                "like": 120,
                "coin": 40,
                "favorite": 80,
                "share": 10,
                "danmaku": 25,
                "reply": 15
            }
        }
    })
}

#[tokio::test]
async fn get_video_stats_returns_parsed_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .and(query_param("bvid", "BV1xx411x7xx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_body("BV1xx411x7xx", 5000)))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let stats = client
        .get_video_stats("BV1xx411x7xx")
        .await
        .expect("should parse stats")
        .expect("video should exist");

    assert_eq!(stats.bvid, "BV1xx411x7xx");
    assert_eq!(stats.views, 5000);
    assert_eq!(stats.likes, 120);
    assert_eq!(stats.coins, 40);
    assert_eq!(stats.favorites, 80);
    assert_eq!(stats.shares, 10);
    assert_eq!(stats.danmaku, 25);
    assert_eq!(stats.comments, 15);
    assert!(stats.publish_time.is_some());
}

#[tokio::test]
async fn deleted_video_returns_none() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "code": -404,
        "message": "video not found",
        "data": null
    });
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let stats = client
        .get_video_stats("BV1gone")
        .await
        .expect("gone must not be an error");
    assert!(stats.is_none());
}

#[tokio::test]
async fn private_video_returns_none() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "code": 62002,
        "message": "video is private",
        "data": null
    });
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let stats = client.get_video_stats("BV1priv").await.unwrap();
    assert!(stats.is_none());
}

#[tokio::test]
async fn http_404_returns_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let stats = client.get_video_stats("BV1missing").await.unwrap();
    assert!(stats.is_none());
}

#[tokio::test]
async fn throttled_response_is_retried_until_success() {
    let server = MockServer::start().await;

    let throttle = serde_json::json!({
        "code": -412,
        "message": "request was throttled",
        "data": null
    });
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&throttle))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_body("BV1retry", 777)))
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server.uri(), 3);
    let stats = client
        .get_video_stats("BV1retry")
        .await
        .expect("should succeed after retries")
        .expect("video should exist");
    assert_eq!(stats.views, 777);
}

#[tokio::test]
async fn throttle_exhaustion_surfaces_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server.uri(), 1);
    let err = client.get_video_stats("BV1hot").await.unwrap_err();
    assert!(matches!(err, ClientError::Throttled { .. }), "got {err:?}");
}

#[tokio::test]
async fn server_error_surfaces_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.get_video_stats("BV1down").await.unwrap_err();
    assert!(
        matches!(err, ClientError::UnexpectedStatus { status: 503, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn get_channel_info_merges_follower_count() {
    let server = MockServer::start().await;

    let acc = serde_json::json!({
        "code": 0,
        "message": "0",
        "data": { "name": "demo channel", "sign": "about text" }
    });
    let relation = serde_json::json!({
        "code": 0,
        "message": "0",
        "data": { "follower": 12345 }
    });
    Mock::given(method("GET"))
        .and(path("/x/space/acc/info"))
        .and(query_param("mid", "642389251"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&acc))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/relation/stat"))
        .and(query_param("vmid", "642389251"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&relation))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let info = client
        .get_channel_info("642389251")
        .await
        .expect("should parse channel info")
        .expect("channel should exist");
    assert_eq!(info.uid, "642389251");
    assert_eq!(info.name, "demo channel");
    assert_eq!(info.description, "about text");
    assert_eq!(info.follower_count, 12345);
}

#[tokio::test]
async fn missing_account_returns_none() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "code": -404,
        "message": "user does not exist",
        "data": null
    });
    Mock::given(method("GET"))
        .and(path("/x/space/acc/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let info = client.get_channel_info("999999").await.unwrap();
    assert!(info.is_none());
}

#[tokio::test]
async fn get_recent_videos_parses_listing() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "code": 0,
        "message": "0",
        "data": {
            "list": {
                "vlist": [
                    {
                        "bvid": "BV1aaa",
                        "title": "first",
                        "description": "newest upload",
                        "length": "12:34",
                        "play": 4000,
                        "comment": 12,
                        "created": 1_700_000_000
                    },
                    {
                        "bvid": "BV1bbb",
                        "title": "second",
                        "description": "",
                        "length": "01:02:03",
                        "play": 900,
                        "comment": 3,
                        "created": 1_699_000_000
                    }
                ]
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/x/space/arc/search"))
        .and(query_param("mid", "123"))
        .and(query_param("pn", "1"))
        .and(query_param("ps", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let videos = client
        .get_recent_videos("123", 10)
        .await
        .expect("should parse listing")
        .expect("account should exist");
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].bvid, "BV1aaa");
    assert_eq!(videos[0].duration_secs, 754);
    assert_eq!(videos[1].duration_secs, 3723);
    assert_eq!(videos[1].views, 900);
}

#[tokio::test]
async fn get_recent_videos_truncates_to_requested_count() {
    let server = MockServer::start().await;

    let vlist: Vec<serde_json::Value> = (0..50)
        .map(|i| {
            serde_json::json!({
                "bvid": format!("BV{i:03}"),
                "title": format!("video {i}"),
                "description": "",
                "length": "05:00",
                "play": 100,
                "comment": 0,
                "created": 1_700_000_000
            })
        })
        .collect();
    let body = serde_json::json!({
        "code": 0,
        "message": "0",
        "data": { "list": { "vlist": vlist } }
    });
    Mock::given(method("GET"))
        .and(path("/x/space/arc/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let videos = client.get_recent_videos("123", 5).await.unwrap().unwrap();
    assert_eq!(videos.len(), 5);
    assert_eq!(videos[0].bvid, "BV000");
}
