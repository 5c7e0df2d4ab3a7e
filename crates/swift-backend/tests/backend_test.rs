//! Integration tests for opening a backend and the metadata operations

use std::sync::Arc;
use swift_backend::client::{ClientError, SwiftClient};
use swift_backend::{
    Backend, Config, Error, FileType, Handle, MemoryClient, SwiftBackend, CONTENT_TYPE,
};
use swift_testing::assertions::{assert_already_exists, assert_not_found};
use swift_testing::fixtures::payload;
use swift_testing::{init_tracing, Op, RecordingClient, TestBackend};

#[tokio::test]
async fn test_save_stat_test_remove() {
    init_tracing();
    let tb = TestBackend::open("cnt3", "pre").await.unwrap();
    let be = &tb.backend;
    let h = Handle::new(FileType::Data, "abc123");
    let data = payload(1234);

    be.save(&h, data.clone()).await.unwrap();
    assert_eq!(be.stat(&h).await.unwrap().size, 1234);
    assert!(be.test(FileType::Data, "abc123").await.unwrap());

    let stored = tb.memory.object_data("cnt3", "pre/Data/abc123").await.unwrap();
    assert_eq!(stored.as_ref(), data.as_slice());

    be.remove(FileType::Data, "abc123").await.unwrap();
    assert!(!be.test(FileType::Data, "abc123").await.unwrap());
    assert_not_found(&be.stat(&h).await);
}

#[tokio::test]
async fn test_remote_key_layout() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    tb.backend.save(&Handle::config(), payload(4)).await.unwrap();
    tb.backend
        .save(&Handle::new(FileType::Snapshot, "s1"), payload(4))
        .await
        .unwrap();

    assert_eq!(
        tb.memory.object_keys("cnt").await,
        vec!["pre/Config".to_string(), "pre/Snapshot/s1".to_string()]
    );

    let tb = TestBackend::open("cnt", "").await.unwrap();
    tb.backend
        .save(&Handle::new(FileType::Key, "k1"), payload(4))
        .await
        .unwrap();
    assert_eq!(tb.memory.object_keys("cnt").await, vec!["Key/k1".to_string()]);
}

#[tokio::test]
async fn test_save_never_overwrites() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    let h = Handle::new(FileType::Data, "abc123");

    tb.backend.save(&h, b"first".to_vec()).await.unwrap();
    assert!(tb.backend.test(FileType::Data, "abc123").await.unwrap());

    let puts = tb.client.count(Op::ObjectPut);
    assert_already_exists(&tb.backend.save(&h, b"second".to_vec()).await);
    assert_eq!(tb.client.count(Op::ObjectPut), puts, "no upload after a hit");

    let stored = tb.memory.object_data("cnt", "pre/Data/abc123").await.unwrap();
    assert_eq!(stored.as_ref(), b"first");
}

#[tokio::test]
async fn test_save_propagates_probe_failure() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    tb.client.fail(
        Op::Object,
        Some("pre/Data/x"),
        ClientError::Transport("connection reset".to_string()),
    );

    let err = tb
        .backend
        .save(&Handle::new(FileType::Data, "x"), payload(3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network { op: "conn.Object", .. }), "{}", err);
    assert_eq!(tb.client.count(Op::ObjectPut), 0);
}

#[tokio::test]
async fn test_uploads_use_binary_content_type() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    tb.backend
        .save(&Handle::new(FileType::Index, "i1"), payload(10))
        .await
        .unwrap();

    let info = tb.memory.object("cnt", "pre/Index/i1").await.unwrap();
    assert_eq!(info.content_type, CONTENT_TYPE);
    assert_eq!(info.bytes, 10);
}

#[tokio::test]
async fn test_invalid_handles_never_reach_the_client() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    tb.client.clear_calls();

    let h = Handle::new(FileType::Data, "");
    let mut buf = [0u8; 4];

    assert!(matches!(tb.backend.save(&h, payload(1)).await, Err(Error::InvalidHandle(_))));
    assert!(matches!(tb.backend.load(&h, &mut buf, 0).await, Err(Error::InvalidHandle(_))));
    assert!(matches!(tb.backend.stat(&h).await, Err(Error::InvalidHandle(_))));
    assert!(matches!(
        tb.backend.test(FileType::Lock, "").await,
        Err(Error::InvalidHandle(_))
    ));
    assert!(matches!(
        tb.backend.remove(FileType::Key, "").await,
        Err(Error::InvalidHandle(_))
    ));

    assert!(tb.client.calls().is_empty());
}

#[tokio::test]
async fn test_test_surfaces_other_failures() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    tb.client.fail(
        Op::Object,
        None,
        ClientError::Status {
            code: 503,
            message: "unavailable".to_string(),
        },
    );

    let err = tb.backend.test(FileType::Data, "abc").await.unwrap_err();
    assert!(!err.is_not_found());
    assert!(matches!(err, Error::Network { .. }));
}

#[tokio::test]
async fn test_remove_missing_object_fails() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    assert_not_found(&tb.backend.remove(FileType::Lock, "nope").await);
}

#[tokio::test]
async fn test_open_creates_container_with_policy() {
    let memory = Arc::new(MemoryClient::new());
    let mut config = Config::parse("swift:///fresh/pre").unwrap();
    config.default_container_policy = "gold".to_string();

    let be = SwiftBackend::open(config, memory.clone()).await.unwrap();
    assert_eq!(be.location(), "fresh");

    let headers = memory.container_headers("fresh").await.unwrap();
    assert_eq!(headers.get("X-Storage-Policy").map(String::as_str), Some("gold"));
}

#[tokio::test]
async fn test_open_keeps_existing_container() {
    let memory = Arc::new(MemoryClient::new());
    memory.create_container("existing").await;
    let recording = RecordingClient::new(memory.clone());

    let config = Config::parse("swift:///existing").unwrap();
    SwiftBackend::open(config, Arc::new(recording.clone()))
        .await
        .unwrap();

    assert_eq!(recording.count(Op::Container), 1);
    assert_eq!(recording.count(Op::ContainerCreate), 0);
    assert!(memory.container_headers("existing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_without_policy_sends_no_header() {
    let memory = Arc::new(MemoryClient::new());
    let config = Config::parse("swift:///plain").unwrap();
    SwiftBackend::open(config, memory.clone()).await.unwrap();

    assert!(memory.container_headers("plain").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_reports_container_create_failure() {
    let recording = RecordingClient::new(Arc::new(MemoryClient::new()));
    recording.fail(
        Op::ContainerCreate,
        Some("cnt"),
        ClientError::Status {
            code: 403,
            message: "forbidden".to_string(),
        },
    );

    let config = Config::parse("swift:///cnt").unwrap();
    let err = SwiftBackend::open(config, Arc::new(recording))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ContainerCreateFailed { .. }), "{}", err);
}

#[tokio::test]
async fn test_open_reports_container_probe_failure() {
    let recording = RecordingClient::new(Arc::new(MemoryClient::new()));
    recording.fail(
        Op::Container,
        None,
        ClientError::Transport("timeout".to_string()),
    );

    let config = Config::parse("swift:///cnt").unwrap();
    let err = SwiftBackend::open(config, Arc::new(recording.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network { .. }), "{}", err);
    assert_eq!(recording.count(Op::ContainerCreate), 0);
}

#[tokio::test]
async fn test_open_authenticates_with_credentials() {
    let memory = Arc::new(MemoryClient::with_account("alice", "secret"));
    let mut config = Config::parse("swift:///cnt").unwrap();
    config.user_name = "alice".to_string();
    config.api_key = "wrong".to_string();

    let err = SwiftBackend::open(config.clone(), memory.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed { .. }), "{}", err);

    config.api_key = "secret".to_string();
    SwiftBackend::open(config, memory.clone()).await.unwrap();
    assert!(memory.is_authenticated());
}

#[tokio::test]
async fn test_open_with_token_skips_authentication() {
    let memory = Arc::new(MemoryClient::with_account("alice", "secret"));
    let recording = RecordingClient::new(memory.clone());

    let config = Config::parse("swift:///cnt")
        .unwrap()
        .apply_environment(|name| match name {
            "OS_STORAGE_URL" => Some("https://swift.example/v1/AUTH_x".to_string()),
            "OS_AUTH_TOKEN" => Some("tok".to_string()),
            _ => None,
        });

    SwiftBackend::open(config, Arc::new(recording.clone()))
        .await
        .unwrap();

    assert_eq!(recording.count(Op::Authenticate), 0);
    assert_eq!(
        memory.token(),
        Some(("https://swift.example/v1/AUTH_x".to_string(), "tok".to_string()))
    );
}

#[tokio::test]
async fn test_open_rejects_invalid_config() {
    let mut config = Config::parse("swift:///cnt").unwrap();
    config.connections = 0;
    assert!(matches!(
        SwiftBackend::open(config, Arc::new(MemoryClient::new())).await,
        Err(Error::Config(_))
    ));

    let config = Config::default();
    assert!(matches!(
        SwiftBackend::open(config, Arc::new(MemoryClient::new())).await,
        Err(Error::Parse(_))
    ));
}

#[tokio::test]
async fn test_backend_trait_object() {
    let tb = TestBackend::open("cnt", "pre").await.unwrap();
    let be: Arc<dyn Backend> = Arc::new(tb.backend.clone());

    be.save(&Handle::new(FileType::Lock, "l1"), payload(5).into())
        .await
        .unwrap();
    assert_eq!(be.stat(&Handle::new(FileType::Lock, "l1")).await.unwrap().size, 5);
    assert_eq!(be.location(), "cnt");
    be.close().await.unwrap();
}
