//! Assertion helpers for access layer testing.

use helios_access::error::{AccessError, ConfigError, StorageError};
use helios_access::types::Document;
use helios_access::StorageResult;

/// Collects a filtered iterator, failing the test on any error item.
pub fn collect_ok<I>(iter: I) -> Vec<Document>
where
    I: Iterator<Item = StorageResult<Document>>,
{
    iter.collect::<StorageResult<Vec<_>>>()
        .expect("filter yielded an error")
}

/// Returns the ids of the given documents in order.
pub fn ids(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .map(|doc| doc.id().expect("document without _id"))
        .collect()
}

/// Asserts that an error is a level denial with the given message.
pub fn assert_denied(err: &StorageError, expected_message: &str) {
    match err {
        StorageError::Access(AccessError::Denied { .. }) => {
            assert_eq!(err.to_string(), expected_message)
        }
        other => panic!("Expected a level denial, got {:?}", other),
    }
}

/// Asserts that an error is a flag denial.
pub fn assert_flags_denied(err: &StorageError) {
    assert!(
        matches!(err, StorageError::Access(AccessError::FlagsDenied { .. })),
        "Expected a flag denial, got {:?}",
        err
    );
}

/// Asserts that an error is a "not found" error.
pub fn assert_not_found(err: &StorageError) {
    assert!(err.is_not_found(), "Expected not found, got {:?}", err);
}

/// Asserts that an error is a missing owner reference.
pub fn assert_missing_reference(err: &StorageError) {
    assert!(
        matches!(
            err,
            StorageError::Config(ConfigError::MissingOwnerReference { .. })
        ),
        "Expected a missing owner reference, got {:?}",
        err
    );
}
