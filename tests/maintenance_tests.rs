//! # Metadata Maintenance Tests
//!
//! Label/annotation patching never creates, deletes or touches data, and
//! treats a missing secret as a no-op.

mod common;

use common::*;
use secret_template_sync::maintenance::{patch_metadata, patch_metadata_all, PatchOutcome};
use secret_template_sync::store::Operation;

#[tokio::test]
async fn test_patch_of_missing_secret_is_a_no_op() {
    let store = FakeSecretStore::new();

    let outcome = patch_metadata(&store, &unidentified("a", "gone")).await.unwrap();

    assert_eq!(outcome, PatchOutcome::Missing);
    assert_eq!(store.calls(), vec![call(Call::PatchMetadata, "a", "gone")]);
}

#[tokio::test]
async fn test_patch_updates_metadata_and_leaves_data() {
    let mut existing = live("a", "s1", "u1");
    existing.labels = string_map(&[("x", "0"), ("y", "2")]);
    existing.data = data_map(&[("k", "v")]);
    let store = FakeSecretStore::with_secrets([existing]);

    let mut secret = identified("a", "s1", "u1");
    secret.labels = string_map(&[("x", "1"), ("y", "2")]);
    secret.annotations = string_map(&[("owner", "ops")]);
    secret.data = data_map(&[]);

    let outcome = patch_metadata(&store, &secret).await.unwrap();

    assert_eq!(outcome, PatchOutcome::Patched);
    let stored = store.secret("a", "s1").unwrap();
    assert_eq!(stored.labels, string_map(&[("x", "1"), ("y", "2")]));
    assert_eq!(stored.annotations, string_map(&[("owner", "ops")]));
    assert_eq!(stored.data, data_map(&[("k", "v")]));
    assert_eq!(stored.markers.uid, "u1");
}

#[tokio::test]
async fn test_other_patch_errors_are_fatal() {
    let store = FakeSecretStore::with_secrets([live("a", "s1", "u1"), live("a", "s2", "u2")]);
    store.fail_always(Operation::PatchMetadata, "a", "s1");

    let err = patch_metadata_all(
        &store,
        &[identified("a", "s1", "u1"), identified("a", "s2", "u2")],
    )
    .await
    .unwrap_err();

    assert_eq!(err.key.name, "s1");
    assert!(!err.source.is_not_found());
    assert_eq!(store.calls(), vec![call(Call::PatchMetadata, "a", "s1")]);
}

#[tokio::test]
async fn test_patch_never_mutates_objects() {
    let store = FakeSecretStore::with_secrets([live("a", "s1", "u1")]);

    let tally = patch_metadata_all(
        &store,
        &[identified("a", "s1", "u1"), unidentified("a", "absent")],
    )
    .await
    .unwrap();

    assert_eq!(tally.patched, 1);
    assert_eq!(tally.missing, 1);
    assert!(store
        .calls()
        .iter()
        .all(|c| matches!(c, Call::PatchMetadata(..))));
    assert!(store.secret("a", "absent").is_none());
}
