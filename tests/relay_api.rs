//! End-to-end tests: the relay and a stand-in TensorBoard, each on an
//! ephemeral port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use prost::Message;
use serde_json::{json, Value};
use tempfile::TempDir;

use tensorboard_relay::client::{ClientError, HistogramEvent, HistogramPayload, ScalarEvent, TbClient};
use tensorboard_relay::events::record::decode_records;
use tensorboard_relay::handlers::NOT_FOUND_MESSAGE;
use tensorboard_relay::pb::{event, summary, Event};
use tensorboard_relay::{server, AppState, RelayConfig};

// ─── Fixtures ────────────────────────────────────────────────────

async fn fake_runs() -> Json<Value> {
    Json(json!({
        "run-a": {
            "scalars": ["loss"],
            "histograms": ["weights"],
            "images": [],
            "audio": [],
            "graph": false,
            "run_metadata": [],
        },
        "run-b": { "scalars": [] },
    }))
}

async fn fake_series(Query(q): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    match (q.get("run").map(String::as_str), q.get("tag").map(String::as_str)) {
        (Some("run-a"), Some("loss")) => Ok(Json(json!([[1500000000.0, 1, 0.5]]))),
        (Some("run-a"), Some("weights")) => Ok(Json(json!([[1500000000.0, 1, [0.0, 3.0, 3.0, 6.0, 14.0, [], []]]]))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_tensorboard() -> SocketAddr {
    let app = Router::new()
        .route("/data/runs", get(fake_runs))
        .route("/data/scalars", get(fake_series))
        .route("/data/histograms", get(fake_series));
    spawn(app).await
}

/// An address nothing listens on.
async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

struct Relay {
    addr: SocketAddr,
    log_dir: TempDir,
}

impl Relay {
    async fn start(tensorboard: SocketAddr) -> Self {
        let log_dir = tempfile::tempdir().unwrap();
        let config = RelayConfig {
            bind_addr: "127.0.0.1".into(),
            port: 0,
            log_dir: log_dir.path().to_path_buf(),
            tensorboard_url: format!("http://{tensorboard}"),
            proxy_timeout: Duration::from_secs(1),
        };
        let state = Arc::new(AppState::new(config).unwrap());
        let addr = spawn(server::create_router(state)).await;
        Self { addr, log_dir }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn client(&self) -> TbClient {
        TbClient::connect("127.0.0.1", self.addr.port()).await.unwrap()
    }

    async fn post_raw(&self, path: &str, key: &str) -> (StatusCode, String) {
        let resp = reqwest::Client::new()
            .post(self.url(path))
            .form(&[(key, "")])
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.text().await.unwrap())
    }
}

/// Summary events written for `experiment`, in file order.
fn written_values(log_dir: &Path, experiment: &str) -> Vec<(f64, i64, summary::Value)> {
    let dir = log_dir.join(experiment);
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let bytes = std::fs::read(entry.unwrap().path()).unwrap();
        for record in decode_records(&bytes).unwrap() {
            let event = Event::decode(record.as_slice()).unwrap();
            if let Some(event::What::Summary(s)) = event.what {
                for value in s.value {
                    out.push((event.wall_time, event.step, value));
                }
            }
        }
    }
    out
}

// ─── Listing ─────────────────────────────────────────────────────

#[tokio::test]
async fn lists_experiments() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    assert_eq!(client.experiments().await.unwrap(), vec!["run-a", "run-b"]);
}

#[tokio::test]
async fn experiment_metadata_drops_unsupported_types() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    let meta = client.experiment("run-a").await.unwrap();
    assert_eq!(meta, json!({ "scalars": ["loss"], "histograms": ["weights"] }));
}

#[tokio::test]
async fn unknown_experiment_is_a_bad_request() {
    let relay = Relay::start(spawn_tensorboard().await).await;

    let resp = reqwest::get(relay.url("/data?xp=nope")).await.unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(resp.text().await.unwrap(), "Unknown experiment name 'nope'");
}

// ─── Proxied reads ───────────────────────────────────────────────

#[tokio::test]
async fn scalar_and_histogram_series_are_proxied() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    let scalars = client.get_scalars("run-a", "loss").await.unwrap();
    assert_eq!(scalars, json!([[1500000000.0, 1, 0.5]]));

    let histograms = client.get_histograms("run-a", "weights").await.unwrap();
    assert_eq!(histograms[0][1], json!(1));
}

#[tokio::test]
async fn unknown_series_is_a_bad_request() {
    let relay = Relay::start(spawn_tensorboard().await).await;

    let resp = reqwest::get(relay.url("/data/scalars?xp=run-a&name=acc")).await.unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(
        resp.text().await.unwrap(),
        "Combination of experiment 'run-a' and name 'acc' does not exist"
    );
}

#[tokio::test]
async fn series_requires_xp_and_name() {
    let relay = Relay::start(spawn_tensorboard().await).await;

    for path in ["/data/scalars?xp=run-a", "/data/histograms?name=loss", "/data/scalars?xp=&name=loss"] {
        let resp = reqwest::get(relay.url(path)).await.unwrap();
        assert_eq!(resp.status().as_u16(), 400, "{path}");
        assert_eq!(resp.text().await.unwrap(), "xp and name arguments are required");
    }
}

// ─── Writes ──────────────────────────────────────────────────────

#[tokio::test]
async fn scalar_is_written_to_event_file() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    client
        .add_scalar("fresh", "loss", ScalarEvent::new(1_600_000_000.25, 4, 0.75))
        .await
        .unwrap();
    client
        .add_scalar("fresh", "loss", ScalarEvent::new(1_600_000_001.0, 5, 0.5))
        .await
        .unwrap();

    let written = written_values(relay.log_dir.path(), "fresh");
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].0, 1_600_000_000.25);
    assert_eq!(written[0].1, 4);
    assert_eq!(written[0].2.tag, "loss");
    assert_eq!(
        written[1].2.value,
        Some(summary::value::Value::SimpleValue(0.5))
    );
}

#[tokio::test]
async fn histogram_is_built_from_samples() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    let event = HistogramEvent::new(10.0, 1, HistogramPayload::Samples(vec![1.0, 2.0, 3.0]));
    client.add_histogram("hist", "weights", &event).await.unwrap();

    let written = written_values(relay.log_dir.path(), "hist");
    let Some(summary::value::Value::Histo(histo)) = &written[0].2.value else {
        panic!("expected a histogram");
    };
    assert_eq!(histo.num, 3.0);
    assert_eq!(histo.min, 1.0);
    assert_eq!(histo.max, 3.0);
    assert_eq!(histo.sum, 6.0);
    assert_eq!(histo.sum_squares, 14.0);
    assert_eq!(histo.bucket.iter().sum::<f64>(), 3.0);
}

#[tokio::test]
async fn prebuilt_histogram_is_written_as_given() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    let fields = json!({
        "min": 0.5, "max": 2, "num": 2,
        "bucket_limit": [0.5, 2.0], "bucket": [1, 1],
    });
    let event = HistogramEvent::from_values(&[json!(3.0), json!(7), fields], false).unwrap();
    client.add_histogram("built", "w", &event).await.unwrap();

    let written = written_values(relay.log_dir.path(), "built");
    let Some(summary::value::Value::Histo(histo)) = &written[0].2.value else {
        panic!("expected a histogram");
    };
    assert_eq!(written[0].1, 7);
    assert_eq!(histo.bucket_limit, vec![0.5, 2.0]);
    assert_eq!(histo.bucket, vec![1.0, 1.0]);
    assert_eq!(histo.sum, 0.0);
}

#[tokio::test]
async fn prebuilt_histogram_missing_field_is_rejected() {
    let relay = Relay::start(spawn_tensorboard().await).await;

    for field in ["min", "max", "num", "bucket_limit", "bucket"] {
        let mut fields = json!({
            "min": 1, "max": 3, "num": 3,
            "bucket_limit": [1.0, 2.0, 3.0], "bucket": [1, 1, 1],
        });
        fields.as_object_mut().unwrap().remove(field);
        let key = json!([1.0, 1, fields]).to_string();

        let (status, body) = relay
            .post_raw("/data/histograms?xp=x&name=h&tobuild=false", &key)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, format!("Missing argument {field} to the given histogram"));
    }
}

#[tokio::test]
async fn malformed_posts_are_rejected() {
    let relay = Relay::start(spawn_tensorboard().await).await;

    let (status, body) = relay.post_raw("/data/scalars?xp=x&name=s", "[1.0, 2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "POST does not contain a list of 3 elements but '[1.0,2]'");

    let (status, body) = relay.post_raw("/data/histograms?xp=x&name=h", "[1.0, 2, [1]]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "xp, name and tobuild arguments are required");

    let (status, _) = relay
        .post_raw("/data/histograms?xp=x&name=h&tobuild=true", "[1.0, 2, []]")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = relay.post_raw("/data/scalars?xp=..&name=s", "[1.0, 2, 3]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid experiment name '..'");
}

#[tokio::test]
async fn client_rejects_unaccepted_key_sets() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    let fields = json!({ "min": 1, "max": 3, "num": 3, "bucket": [3] });
    let event = HistogramEvent::from_values(&[json!(1.0), json!(0), fields], false).unwrap();
    let err = client.add_histogram("x", "h", &event).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
}

#[tokio::test]
async fn client_refuses_non_finite_numbers() {
    let relay = Relay::start(spawn_tensorboard().await).await;
    let client = relay.client().await;

    let err = client
        .add_scalar("nan-run", "s", ScalarEvent::new(1.0, 1, f64::NAN))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));

    let event = HistogramEvent::new(1.0, 0, HistogramPayload::Samples(vec![1.0, f64::INFINITY]));
    let err = client.add_histogram("nan-run", "h", &event).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));

    // nothing reached the relay
    assert!(!relay.log_dir.path().join("nan-run").exists());
}

// ─── Misc ────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_route_gets_fixed_404() {
    let relay = Relay::start(spawn_tensorboard().await).await;

    let resp = reqwest::get(relay.url("/nowhere")).await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(resp.text().await.unwrap(), NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn responses_carry_no_timing_headers() {
    let relay = Relay::start(spawn_tensorboard().await).await;

    for (path, status) in [("/data", 200), ("/data/scalars", 400), ("/nowhere", 404)] {
        let resp = reqwest::get(relay.url(path)).await.unwrap();
        assert_eq!(resp.status().as_u16(), status, "{path}");
        assert!(resp.headers().get("x-response-time-us").is_none());
        assert!(resp.headers().get("server-timing").is_none());
    }
}

#[tokio::test]
async fn connect_fails_fast_when_relay_is_down() {
    let addr = dead_addr().await;
    let err = TbClient::connect("127.0.0.1", addr.port()).await.err().unwrap();
    assert!(matches!(err, ClientError::ServerDown(_)));
}

#[tokio::test]
async fn connect_fails_fast_when_tensorboard_is_down() {
    let relay = Relay::start(dead_addr().await).await;
    let err = TbClient::connect("127.0.0.1", relay.addr.port()).await.err().unwrap();
    assert!(matches!(err, ClientError::Backend { status: 400, .. }));
}
