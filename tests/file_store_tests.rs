mod common;

use common::{clock_at, sign_document, test_keypair, FixedDevice};
use keystamp::{
    FileStore, KeystampError, LicenseStore, LicenseValidator, SignatureFailure, Verdict,
};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn validator() -> LicenseValidator {
    let (_, public_key) = test_keypair();
    LicenseValidator::new(
        public_key,
        "X",
        clock_at("2026-10-17T09:30:00Z"),
        Arc::new(FixedDevice("SHA256:abc")),
    )
}

#[test]
fn saved_license_validates_after_reopening() {
    let dir = TempDir::new().unwrap();
    let (signing_key, _) = test_keypair();
    let record = sign_document(
        &signing_key,
        json!({
            "license_id": "L1",
            "app_id": "X",
            "device_hash": "SHA256:abc",
            "plan": "lifetime",
            "features": {"export": true}
        }),
    );

    FileStore::with_path(dir.path().to_path_buf())
        .unwrap()
        .save(&record)
        .unwrap();

    let reopened = FileStore::with_path(dir.path().to_path_buf()).unwrap();
    let verdict = validator().validate(&reopened).unwrap();

    assert!(verdict.may_proceed());
    let summary = verdict.summary().unwrap();
    assert_eq!(summary.plan.as_deref(), Some("lifetime"));
    assert_eq!(summary.features.get("export"), Some(&json!(true)));
}

#[test]
fn hand_edited_file_is_signature_invalid() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::with_path(dir.path().to_path_buf()).unwrap();
    let (signing_key, _) = test_keypair();
    let record = sign_document(
        &signing_key,
        json!({
            "license_id": "L1",
            "app_id": "X",
            "device_hash": "SHA256:abc",
            "expires_at": "2027-01-01T00:00:00Z"
        }),
    );
    store.save(&record).unwrap();

    let edited = fs::read_to_string(store.license_path())
        .unwrap()
        .replace("2027-01-01", "2099-01-01");
    fs::write(store.license_path(), edited).unwrap();

    assert_eq!(
        validator().validate(&store).unwrap(),
        Verdict::SignatureInvalid(SignatureFailure::VerificationFailed)
    );
}

#[test]
fn record_missing_required_field_is_signature_invalid() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::with_path(dir.path().to_path_buf()).unwrap();
    fs::write(
        store.license_path(),
        r#"{"license_id":"L1","app_id":"X","signature":"ed25519:AA=="}"#,
    )
    .unwrap();

    let verdict = validator().validate(&store).unwrap();
    assert!(matches!(
        verdict,
        Verdict::SignatureInvalid(SignatureFailure::MalformedRecord(_))
    ));
}

#[test]
fn garbage_file_is_a_store_fault() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::with_path(dir.path().to_path_buf()).unwrap();
    fs::write(store.license_path(), "not json at all").unwrap();

    assert!(matches!(
        validator().validate(&store),
        Err(KeystampError::StoreCorrupt(_))
    ));
}

#[test]
fn cleared_store_is_not_activated() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::with_path(dir.path().to_path_buf()).unwrap();
    let (signing_key, _) = test_keypair();
    store
        .save(&sign_document(
            &signing_key,
            json!({"license_id": "L1", "app_id": "X", "device_hash": "SHA256:abc"}),
        ))
        .unwrap();

    store.clear().unwrap();
    store.clear().unwrap();

    assert_eq!(validator().validate(&store).unwrap(), Verdict::NotActivated);
}
