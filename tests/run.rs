use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{Router, extract::State, http::StatusCode, routing::get};
use barrage::{Error, LoadConfig, RUN_DEADLINE, run};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn ok_router() -> Router {
    Router::new().route("/", get(|| async { "OK" }))
}

fn delayed_router(delay: Duration) -> Router {
    Router::new().route(
        "/",
        get(move || async move {
            tokio::time::sleep(delay).await;
            "OK"
        }),
    )
}

#[derive(Clone, Default)]
struct Tracker {
    hits: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

async fn tracked(State(t): State<Tracker>) -> &'static str {
    t.hits.fetch_add(1, Ordering::SeqCst);
    let now = t.active.fetch_add(1, Ordering::SeqCst) + 1;
    t.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    t.active.fetch_sub(1, Ordering::SeqCst);
    "OK"
}

async fn alternating(State(t): State<Tracker>) -> (StatusCode, &'static str) {
    let n = t.hits.fetch_add(1, Ordering::SeqCst);
    if n % 2 == 0 {
        (StatusCode::OK, "Response")
    } else {
        (StatusCode::NOT_FOUND, "Response")
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_request() {
    let url = serve(ok_router()).await;
    let config = LoadConfig::new(&url, 1, 1).unwrap();

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.total_requests, 1);
    assert_eq!(report.successful_requests, 1);
    assert_eq!(report.status_counts.get(&200), Some(&1));
    assert_eq!(report.error_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_response_ok() {
    let url = serve(ok_router()).await;
    let config = LoadConfig::new(&url, 50, 7).unwrap();

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.total_requests, 50);
    assert_eq!(report.successful_requests, 50);
    assert_eq!(report.status_counts.get(&200), Some(&50));
    assert_eq!(report.status_counts.len(), 1);
    assert_eq!(report.error_count, 0);
    assert!(report.min_response_time <= report.avg_response_time);
    assert!(report.avg_response_time <= report.max_response_time);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn alternating_status_codes_split_evenly() {
    let tracker = Tracker::default();
    let app = Router::new()
        .route("/", get(alternating))
        .with_state(tracker.clone());
    let url = serve(app).await;
    let config = LoadConfig::new(&url, 6, 2).unwrap();

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.total_requests, 6);
    assert_eq!(report.status_counts.get(&200), Some(&3));
    assert_eq!(report.status_counts.get(&404), Some(&3));
    assert_eq!(report.successful_requests, 3);
    assert_eq!(
        report.status_counts.values().sum::<usize>() + report.error_count,
        report.total_requests
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn peak_in_flight_never_exceeds_concurrency() {
    let tracker = Tracker::default();
    let app = Router::new()
        .route("/", get(tracked))
        .with_state(tracker.clone());
    let url = serve(app).await;
    let config = LoadConfig::new(&url, 40, 5).unwrap();

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.total_requests, 40);
    assert_eq!(tracker.hits.load(Ordering::SeqCst), 40);
    let peak = tracker.peak.load(Ordering::SeqCst);
    assert!(peak <= 5, "server saw {peak} concurrent requests");
    assert!(peak >= 2, "requests never overlapped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_above_requests_is_clamped() {
    let tracker = Tracker::default();
    let app = Router::new()
        .route("/", get(tracked))
        .with_state(tracker.clone());
    let url = serve(app).await;
    let config = LoadConfig::new(&url, 4, 100).unwrap();
    assert_eq!(config.concurrency(), 4);

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.total_requests, 4);
    assert!(tracker.peak.load(Ordering::SeqCst) <= 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sequential_run_takes_n_times_the_delay() {
    let delay = Duration::from_millis(100);
    let url = serve(delayed_router(delay)).await;
    let config = LoadConfig::new(&url, 3, 1).unwrap();

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.successful_requests, 3);
    assert!(
        report.total_time >= delay * 3,
        "took {:?}",
        report.total_time
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_run_takes_about_one_delay() {
    let delay = Duration::from_millis(200);
    let url = serve(delayed_router(delay)).await;
    let config = LoadConfig::new(&url, 5, 5).unwrap();

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.successful_requests, 5);
    assert!(report.total_time >= delay);
    assert!(
        report.total_time < delay * 4,
        "took {:?}, requests did not overlap",
        report.total_time
    );
    // Wall-clock time is less than the summed latencies
    assert!(report.total_time < report.avg_response_time * 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refused_connections_are_counted_as_errors() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = LoadConfig::new(&format!("http://127.0.0.1:{port}/"), 5, 2).unwrap();

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.total_requests, 5);
    assert_eq!(report.error_count, 5);
    assert_eq!(report.successful_requests, 0);
    assert!(report.status_counts.is_empty());

    let text = report.render();
    assert!(text.contains("Connection/timeout errors: 5"));
    assert!(text.contains("Success rate: 0.00%"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn per_request_timeout_becomes_error() {
    let url = serve(delayed_router(Duration::from_secs(10))).await;
    let config = LoadConfig::new(&url, 3, 3)
        .unwrap()
        .with_timeout(Duration::from_millis(200));

    let report = run(&config, RUN_DEADLINE).await.unwrap();

    assert_eq!(report.total_requests, 3);
    assert_eq!(report.error_count, 3);
    assert!(report.total_time < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_deadline_cancels_outstanding_requests() {
    let url = serve(delayed_router(Duration::from_secs(10))).await;
    let config = LoadConfig::new(&url, 6, 2).unwrap();

    let report = run(&config, Duration::from_millis(300)).await.unwrap();

    assert_eq!(report.total_requests, 6);
    assert_eq!(report.error_count, 6);
    assert!(report.status_counts.is_empty());
    assert!(
        report.total_time < Duration::from_secs(5),
        "cancellation took {:?}",
        report.total_time
    );
}

#[tokio::test]
async fn invalid_configuration_is_rejected_up_front() {
    assert!(matches!(
        LoadConfig::new("http://127.0.0.1:1/", 0, 1),
        Err(Error::ZeroRequests)
    ));
    assert!(matches!(
        LoadConfig::new("http://127.0.0.1:1/", 1, 0),
        Err(Error::ZeroConcurrency)
    ));
    assert!(matches!(
        LoadConfig::new("127.0.0.1:1", 1, 1),
        Err(Error::InvalidUrl { .. } | Error::UnsupportedScheme(_))
    ));
}
