//! Export job client behavior against a scripted executor

mod common;

use common::{ScriptedExecutor, TEST_OID};
use goshawk_search::download::{DownloadClient, DownloadOptions, WaitOptions};
use goshawk_search::transport::HttpMethod;
use goshawk_search::{ApiError, DownloadState, DownloadStatus, SearchQuery};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn query() -> SearchQuery {
    SearchQuery::new("event_type = DNS_REQUEST", 1700000000, 1700086400)
}

fn status_json(state: &str) -> Value {
    json!({ "jobId": "dl-1", "status": state })
}

fn fast_wait() -> WaitOptions {
    WaitOptions {
        poll_interval: Duration::ZERO,
        timeout: None,
    }
}

#[tokio::test]
async fn initiate_sends_compression_and_string_times() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({
        "jobId": "dl-1",
        "estimatedStats": {
            "eventsScanned": 50000,
            "eventsMatched": 1200,
            "estimatedPrice": { "price": 0.25, "currency": "USD" },
        },
    }))]);
    let client = DownloadClient::new(executor.clone(), TEST_OID);

    let job = client
        .initiate(&query(), &DownloadOptions::new())
        .await
        .unwrap();
    assert_eq!(job.job_id, "dl-1");
    let stats = job.estimated_stats.unwrap();
    assert_eq!(stats.estimated_price.unwrap().price, 0.25);

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, HttpMethod::Post);
    assert_eq!(calls[0].path, "search/download");
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["oid"], TEST_OID);
    assert_eq!(body["compression"], "zip");
    assert_eq!(body["startTime"], "1700000000");
    assert_eq!(body["endTime"], "1700086400");
}

#[tokio::test]
async fn initiate_without_job_id_is_protocol_error() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({ "accepted": true }))]);
    let client = DownloadClient::new(executor, TEST_OID);

    let err = client
        .initiate(&query(), &DownloadOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Protocol(_)));
}

#[tokio::test]
async fn list_sends_stringified_window() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({
        "jobs": [status_json("completed"), status_json("running")],
    }))]);
    let client = DownloadClient::new(executor.clone(), TEST_OID);

    let jobs = client.list(Some(10), Some(20)).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].status, DownloadState::Completed);

    let calls = executor.calls();
    assert_eq!(calls[0].path, "search/download");
    assert_eq!(calls[0].params.get("limit").map(String::as_str), Some("10"));
    assert_eq!(calls[0].params.get("offset").map(String::as_str), Some("20"));
}

#[tokio::test]
async fn cancel_conflict_propagates() {
    let executor = ScriptedExecutor::new(vec![Err(ApiError::Status {
        status: 409,
        message: "job already completed".to_string(),
    })]);
    let client = DownloadClient::new(executor, TEST_OID);

    match client.cancel("dl-1").await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 409),
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_follows_job_to_completion() {
    let executor = ScriptedExecutor::new(vec![
        Ok(status_json("queued")),
        Ok(json!({
            "jobId": "dl-1",
            "status": "running",
            "progress": { "eventsProcessed": 1000, "dateRangePercent": 35.0 },
        })),
        Ok(status_json("merging")),
        Ok(json!({
            "jobId": "dl-1",
            "status": "completed",
            "resultUrl": "https://exports.goshawk.io/dl-1.zip",
            "resultExpiry": "2026-09-01T00:00:00Z",
        })),
    ]);
    let client = DownloadClient::new(executor.clone(), TEST_OID);

    let seen: Arc<Mutex<Vec<DownloadState>>> = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let callback = move |s: &DownloadStatus| log.lock().unwrap().push(s.status);
    let status = client
        .wait("dl-1", &fast_wait(), Some(&callback))
        .await
        .unwrap();

    assert_eq!(status.status, DownloadState::Completed);
    assert_eq!(
        status.result_url.as_deref(),
        Some("https://exports.goshawk.io/dl-1.zip")
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            DownloadState::Queued,
            DownloadState::Running,
            DownloadState::Merging
        ]
    );
    assert_eq!(executor.call_count(), 4);
}

#[tokio::test]
async fn wait_surfaces_job_failure_detail() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({
        "jobId": "dl-1",
        "status": "failed",
        "error": "Out of memory",
    }))]);
    let client = DownloadClient::new(executor, TEST_OID);

    match client.wait("dl-1", &fast_wait(), None).await {
        Err(ApiError::QueryFailed(message)) => assert!(message.contains("Out of memory")),
        other => panic!("expected QueryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_returns_cancelled_job_for_inspection() {
    let executor = ScriptedExecutor::new(vec![Ok(status_json("cancelled"))]);
    let client = DownloadClient::new(executor, TEST_OID);

    let status = client.wait("dl-1", &fast_wait(), None).await.unwrap();
    assert_eq!(status.status, DownloadState::Cancelled);
}

#[tokio::test]
async fn wait_times_out_on_stuck_job() {
    let executor = ScriptedExecutor::new(vec![Ok(status_json("queued"))]);
    let client = DownloadClient::new(executor, TEST_OID);

    let options = WaitOptions {
        poll_interval: Duration::ZERO,
        timeout: Some(Duration::ZERO),
    };
    match client.wait("dl-1", &options, None).await {
        Err(ApiError::WaitTimeout { seconds }) => assert_eq!(seconds, 0),
        other => panic!("expected WaitTimeout, got {other:?}"),
    }
}
