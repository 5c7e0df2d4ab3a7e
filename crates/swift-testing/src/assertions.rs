//! Common assertions for swift-backend testing

use swift_backend::{Error, Result};

/// Asserts that a load delivered exactly `expected` bytes and reported a short read
pub fn assert_short_read(result: &Result<usize>, expected: usize) {
    match result {
        Err(err) => assert_eq!(
            err.short_read(),
            Some(expected),
            "expected a short read of {} bytes, got {}",
            expected,
            err
        ),
        Ok(n) => panic!("expected a short read of {} bytes, got a full read of {}", expected, n),
    }
}

/// Asserts that an operation failed because the object is missing
pub fn assert_not_found<T: std::fmt::Debug>(result: &Result<T>) {
    match result {
        Err(err) => assert!(err.is_not_found(), "expected NotFound, got {}", err),
        Ok(v) => panic!("expected NotFound, got Ok({:?})", v),
    }
}

/// Asserts that a save was refused because the key exists
pub fn assert_already_exists(result: &Result<()>) {
    assert!(
        matches!(result, Err(Error::AlreadyExists { .. })),
        "expected AlreadyExists, got {:?}",
        result
    );
}

/// Asserts that two name lists hold the same names, ignoring order
pub fn assert_same_names(got: &[String], want: &[String]) {
    let mut got = got.to_vec();
    let mut want = want.to_vec();
    got.sort();
    want.sort();
    assert_eq!(got, want, "listed names differ");
}
