use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use streamdock_core::{
    ActionRunner, Credential, Settings, Store, SystemAction, SystemError, password,
};
use streamdock_server::{AppState, build_router};
use tokio::{net::TcpListener, sync::oneshot};

/// Records performed actions instead of touching the host; optionally
/// fails every invocation.
#[derive(Default)]
struct RecordingRunner {
    performed: Mutex<Vec<SystemAction>>,
    fail: bool,
}

impl RecordingRunner {
    fn failing() -> Self {
        Self {
            performed: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn performed(&self) -> Vec<SystemAction> {
        self.performed.lock().expect("runner lock").clone()
    }
}

impl ActionRunner for RecordingRunner {
    fn perform(&self, action: SystemAction) -> Result<(), SystemError> {
        self.performed.lock().expect("runner lock").push(action);
        if self.fail {
            Err(SystemError::TimedOut {
                command: action.id().to_owned(),
                timeout: Duration::from_secs(30),
            })
        } else {
            Ok(())
        }
    }
}

async fn start_server(
    config_path: &Path,
    runner: Arc<RecordingRunner>,
) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral socket");
    let address = listener.local_addr().expect("server local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let store = Arc::new(Store::open(config_path));
    let state = AppState::new(store, runner);
    let server = axum::serve(listener, build_router(state)).with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move {
        let _ = server.await;
    });

    (format!("http://{}", address), shutdown_tx)
}

#[tokio::test]
async fn settings_survive_a_server_restart() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();

    let (base, shutdown_tx) = start_server(&config_path, Arc::default()).await;

    let posted = serde_json::json!({
        "interface_scale": 1.5,
        "brightness": 80,
        "gpu_acceleration": false,
        "language": "pl_PL"
    });
    let resp = client
        .post(format!("{base}/api/settings"))
        .json(&posted)
        .send()
        .await
        .expect("post settings");
    assert_eq!(resp.status(), 200);

    let settings: Settings = client
        .get(format!("{base}/api/settings"))
        .send()
        .await
        .expect("get settings")
        .json()
        .await
        .expect("parse settings");
    assert_eq!(settings.interface_scale, 1.5);
    assert_eq!(settings.brightness, 80);
    assert!(!settings.gpu_acceleration);
    assert_eq!(settings.language, "pl_PL");
    // Replacement is wholesale: omitted fields reset to zero values.
    assert_eq!(settings.theme, "");

    let _ = shutdown_tx.send(());

    // A fresh process over the same file sees the same settings.
    let (base, shutdown_tx) = start_server(&config_path, Arc::default()).await;
    let reloaded: Settings = client
        .get(format!("{base}/api/settings"))
        .send()
        .await
        .expect("get settings after restart")
        .json()
        .await
        .expect("parse settings after restart");
    assert_eq!(reloaded, settings);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn credential_lifecycle_hashes_and_forgets() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let (base, shutdown_tx) = start_server(&config_path, Arc::default()).await;

    let resp = client
        .post(format!("{base}/api/login/Netflix"))
        .json(&serde_json::json!({
            "username": "alice",
            "password": "secret",
            "remember": true
        }))
        .send()
        .await
        .expect("post credential");
    assert_eq!(resp.status(), 200);

    let stored: Credential = client
        .get(format!("{base}/api/login/Netflix"))
        .send()
        .await
        .expect("get credential")
        .json()
        .await
        .expect("parse credential");
    assert_eq!(stored.username, "alice");
    assert!(stored.remember);
    assert_ne!(stored.password, "secret");
    assert!(password::verify(&stored.password, "secret"));

    // remember=false forgets the entry entirely.
    let resp = client
        .post(format!("{base}/api/login/Netflix"))
        .json(&serde_json::json!({"remember": false}))
        .send()
        .await
        .expect("post forget");
    assert_eq!(resp.status(), 200);

    let forgotten: Credential = client
        .get(format!("{base}/api/login/Netflix"))
        .send()
        .await
        .expect("get credential")
        .json()
        .await
        .expect("parse credential");
    assert_eq!(forgotten, Credential::default());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn clear_logins_forgets_every_platform() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let (base, shutdown_tx) = start_server(&config_path, Arc::default()).await;

    for platform in ["Netflix", "Twitch"] {
        let resp = client
            .post(format!("{base}/api/login/{platform}"))
            .json(&serde_json::json!({
                "username": "alice",
                "password": "secret",
                "remember": true
            }))
            .send()
            .await
            .expect("post credential");
        assert_eq!(resp.status(), 200);
    }

    let resp = client
        .post(format!("{base}/api/clear-logins"))
        .send()
        .await
        .expect("post clear-logins");
    assert_eq!(resp.status(), 200);

    for platform in ["Netflix", "Twitch"] {
        let credential: Credential = client
            .get(format!("{base}/api/login/{platform}"))
            .send()
            .await
            .expect("get credential")
            .json()
            .await
            .expect("parse credential");
        assert_eq!(credential, Credential::default());
    }

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn bogus_action_is_rejected_without_running_anything() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let runner = Arc::new(RecordingRunner::default());
    let (base, shutdown_tx) = start_server(&config_path, Arc::clone(&runner)).await;

    let before: Settings = client
        .get(format!("{base}/api/settings"))
        .send()
        .await
        .expect("get settings")
        .json()
        .await
        .expect("parse settings");

    let resp = client
        .post(format!("{base}/api/system/bogus-action"))
        .send()
        .await
        .expect("post bogus action");
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.expect("error body"), "Invalid action");
    assert!(runner.performed().is_empty());

    let after: Settings = client
        .get(format!("{base}/api/settings"))
        .send()
        .await
        .expect("get settings")
        .json()
        .await
        .expect("parse settings");
    assert_eq!(after, before);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn valid_action_reaches_the_runner() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let runner = Arc::new(RecordingRunner::default());
    let (base, shutdown_tx) = start_server(&config_path, Arc::clone(&runner)).await;

    let resp = client
        .post(format!("{base}/api/system/reboot"))
        .send()
        .await
        .expect("post reboot");
    assert_eq!(resp.status(), 200);
    assert_eq!(runner.performed(), vec![SystemAction::Reboot]);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn failing_action_returns_formatted_error() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let runner = Arc::new(RecordingRunner::failing());
    let (base, shutdown_tx) = start_server(&config_path, Arc::clone(&runner)).await;

    let resp = client
        .post(format!("{base}/api/system/reboot"))
        .send()
        .await
        .expect("post reboot");
    assert_eq!(resp.status(), 500);
    let body = resp.text().await.expect("error body");
    assert!(
        body.starts_with("Failed to execute reboot:"),
        "unexpected body: {body}"
    );

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn invalid_json_bodies_are_rejected_with_fixed_messages() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let (base, shutdown_tx) = start_server(&config_path, Arc::default()).await;

    let resp = client
        .post(format!("{base}/api/settings"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("post invalid settings");
    assert_eq!(resp.status(), 400);
    assert_eq!(
        resp.text().await.expect("error body"),
        "Invalid settings data"
    );

    let resp = client
        .post(format!("{base}/api/login/Netflix"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("post invalid login");
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.expect("error body"), "Invalid login data");

    // Rejected bodies leave no credential behind.
    let credential: Credential = client
        .get(format!("{base}/api/login/Netflix"))
        .send()
        .await
        .expect("get credential")
        .json()
        .await
        .expect("parse credential");
    assert_eq!(credential, Credential::default());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn unknown_platform_is_rejected() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let (base, shutdown_tx) = start_server(&config_path, Arc::default()).await;

    let resp = client
        .get(format!("{base}/api/login/MySpace"))
        .send()
        .await
        .expect("get unknown platform");
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/api/login/MySpace"))
        .json(&serde_json::json!({
            "username": "alice",
            "password": "secret",
            "remember": true
        }))
        .send()
        .await
        .expect("post unknown platform");
    assert_eq!(resp.status(), 400);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn root_page_and_healthz_respond() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.json");
    let client = reqwest::Client::new();
    let (base, shutdown_tx) = start_server(&config_path, Arc::default()).await;

    let resp = client.get(&base).send().await.expect("get root page");
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.expect("root body");
    assert!(body.contains("StreamDock"));

    let resp = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .expect("get healthz");
    assert_eq!(resp.status(), 200);

    let _ = shutdown_tx.send(());
}
