//! Integration tests for bounding concurrent transfers

use futures_util::future::join_all;
use std::time::Duration;
use swift_backend::{Config, FileType, Handle};
use swift_testing::fixtures::{object_name, payload, seed_objects};
use swift_testing::TestBackend;

async fn pooled(connections: usize) -> TestBackend {
    let mut config = Config::parse("swift:///cnt/pre").unwrap();
    config.connections = connections;
    TestBackend::from_config(config, |c| {
        c.with_transfer_delay(Duration::from_millis(25))
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_saves_share_the_pool() {
    let tb = pooled(2).await;
    assert_eq!(tb.backend.pool().capacity(), 2);

    let saves = (0..8).map(|i| {
        let be = tb.backend.clone();
        async move {
            be.save(&Handle::new(FileType::Data, object_name(i)), payload(64))
                .await
        }
    });
    for result in join_all(saves).await {
        result.unwrap();
    }

    assert_eq!(tb.client.max_in_flight(), 2);
    assert_eq!(tb.backend.pool().in_use(), 0);
    assert_eq!(tb.memory.object_keys("cnt").await.len(), 8);
}

#[tokio::test]
async fn test_loads_share_the_pool() {
    let tb = pooled(3).await;
    let names = seed_objects(&tb.backend, FileType::Index, 9, 32).await.unwrap();

    let loads = names.iter().map(|name| {
        let be = tb.backend.clone();
        let h = Handle::new(FileType::Index, name.as_str());
        async move {
            let mut buf = vec![0u8; 32];
            be.load(&h, &mut buf, 0).await.map(|n| (n, buf))
        }
    });
    for result in join_all(loads).await {
        let (n, buf) = result.unwrap();
        assert_eq!(n, 32);
        assert_eq!(buf, payload(32));
    }

    assert!(tb.client.max_in_flight() <= 3, "{}", tb.client.max_in_flight());
    assert_eq!(tb.client.in_flight(), 0);
}

#[tokio::test]
async fn test_single_connection_serializes_transfers() {
    let tb = pooled(1).await;
    let saves = (0..4).map(|i| {
        let be = tb.backend.clone();
        async move {
            be.save(&Handle::new(FileType::Snapshot, object_name(i)), payload(8))
                .await
        }
    });
    for result in join_all(saves).await {
        result.unwrap();
    }
    assert_eq!(tb.client.max_in_flight(), 1);
}

#[tokio::test]
async fn test_metadata_calls_do_not_take_slots() {
    let tb = pooled(2).await;
    tb.backend
        .save(&Handle::new(FileType::Lock, "l"), payload(4))
        .await
        .unwrap();

    let _a = tb.backend.pool().acquire().await.unwrap();
    let _b = tb.backend.pool().acquire().await.unwrap();

    let info = tokio::time::timeout(
        Duration::from_secs(1),
        tb.backend.stat(&Handle::new(FileType::Lock, "l")),
    )
    .await
    .expect("stat must not wait for a slot")
    .unwrap();
    assert_eq!(info.size, 4);

    let exists = tokio::time::timeout(Duration::from_secs(1), tb.backend.test(FileType::Lock, "l"))
        .await
        .expect("test must not wait for a slot")
        .unwrap();
    assert!(exists);
}

#[tokio::test]
async fn test_waiting_save_proceeds_once_slot_frees() {
    let tb = pooled(1).await;
    let slot = tb.backend.pool().acquire().await.unwrap();

    let be = tb.backend.clone();
    let pending = tokio::spawn(async move {
        be.save(&Handle::new(FileType::Data, "waiting"), payload(4))
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());
    assert!(tb.memory.object_keys("cnt").await.is_empty());

    drop(slot);
    pending.await.unwrap().unwrap();
    assert_eq!(tb.memory.object_keys("cnt").await, vec!["pre/Data/waiting".to_string()]);
}
