//! Integration tests for the blocking facade

use std::sync::Arc;
use swift_backend::{
    BlockingBackend, CancellationToken, Config, FileType, Handle, MemoryClient, PAGE_SIZE,
};
use swift_testing::fixtures::{object_name, payload};

fn open(location: &str) -> BlockingBackend {
    let config = Config::parse(location).unwrap();
    BlockingBackend::open(config, Arc::new(MemoryClient::new())).unwrap()
}

#[test]
fn test_blocking_round_trip() {
    let be = open("swift:///cnt/pre");
    let h = Handle::new(FileType::Data, "abc123");

    be.save(&h, payload(100)).unwrap();
    assert_eq!(be.stat(&h).unwrap().size, 100);
    assert!(be.test(FileType::Data, "abc123").unwrap());

    let mut buf = vec![0u8; 50];
    let err = be.load(&h, &mut buf, -10).unwrap_err();
    assert_eq!(err.short_read(), Some(10));
    assert_eq!(&buf[..10], &payload(100)[90..]);

    be.remove(FileType::Data, "abc123").unwrap();
    assert!(!be.test(FileType::Data, "abc123").unwrap());
    be.close().unwrap();
}

#[test]
fn test_blocking_list_and_delete() {
    let be = open("swift:///cnt");
    be.save(&Handle::config(), payload(4)).unwrap();

    let count = PAGE_SIZE + 5;
    for i in 0..count {
        be.save(&Handle::new(FileType::Key, object_name(i)), payload(2))
            .unwrap();
    }

    let names = be
        .list(FileType::Key, CancellationToken::new())
        .collect_names()
        .unwrap();
    assert_eq!(names.len(), count);
    assert_eq!(names[0], object_name(0));

    be.delete().unwrap();
    assert!(be
        .list(FileType::Key, CancellationToken::new())
        .next()
        .is_none());

    assert!(!be.test(FileType::Config, "").unwrap());
    assert_eq!(be.inner().location(), "cnt");
}

#[test]
fn test_blocking_list_cancel() {
    let be = open("swift:///cnt/pre");
    for i in 0..5 {
        be.save(&Handle::new(FileType::Snapshot, object_name(i)), payload(1))
            .unwrap();
    }

    let mut names = be.list(FileType::Snapshot, CancellationToken::new());
    assert!(names.next().unwrap().is_ok());
    names.cancel();
    assert!(names.count() <= 1);
}
