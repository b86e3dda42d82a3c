use parley::auth::credential::EXPIRY_MARGIN_MS;
use parley::auth::{Credential, SecretStore, SqliteStore, pkce};

/// Helper: create a temp dir with a SqliteStore pointing at it.
fn temp_store() -> (SqliteStore, tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.db").to_string_lossy().into_owned();
    let store = SqliteStore::open(&path).unwrap();
    (store, dir, path)
}

fn sample_credential() -> Credential {
    Credential {
        access_token: "AT1".to_string(),
        refresh_token: Some("RT1".to_string()),
        expires_at: 9_999_999_999_999,
    }
}

// ── PKCE ──────────────────────────────────────────────────────────

#[test]
fn challenge_is_43_char_base64url() {
    let verifier = pkce::generate_verifier();
    let challenge = pkce::derive_challenge(&verifier);
    assert_eq!(challenge.len(), 43);
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
}

#[test]
fn challenge_is_deterministic_for_a_verifier() {
    let verifier = pkce::generate_verifier();
    assert_eq!(
        pkce::derive_challenge(&verifier),
        pkce::derive_challenge(&verifier)
    );
}

#[test]
fn verifier_is_fresh_per_call() {
    assert_ne!(pkce::generate_verifier(), pkce::generate_verifier());
}

#[test]
fn challenge_matches_its_verifier_only() {
    let verifier = pkce::generate_verifier();
    let challenge = pkce::derive_challenge(&verifier);
    assert!(pkce::verify_challenge(&verifier, &challenge));
    assert!(!pkce::verify_challenge(&pkce::generate_verifier(), &challenge));
}

// ── Credential validity margin ────────────────────────────────────

#[test]
fn stale_exactly_at_the_margin() {
    let expires_at: u64 = 1_700_000_000_000;
    let cred = Credential {
        access_token: "AT1".to_string(),
        refresh_token: None,
        expires_at,
    };
    // 300s before expiry: already stale
    assert!(!cred.is_valid_at(expires_at - EXPIRY_MARGIN_MS));
    // 301s before expiry: still good
    assert!(cred.is_valid_at(expires_at - EXPIRY_MARGIN_MS - 1_000));
}

#[test]
fn stale_after_expiry() {
    let cred = Credential {
        access_token: "AT1".to_string(),
        refresh_token: None,
        expires_at: 1_700_000_000_000,
    };
    assert!(!cred.is_valid_at(1_700_000_000_001));
}

// ── Store CRUD ────────────────────────────────────────────────────

#[test]
fn retrieve_returns_none_when_empty() {
    let (store, _dir, _) = temp_store();
    assert!(store.retrieve("default").unwrap().is_none());
}

#[test]
fn store_and_retrieve_roundtrip_is_identical() {
    let (store, _dir, _) = temp_store();
    let cred = sample_credential();
    store.store("default", &cred).unwrap();
    assert_eq!(store.retrieve("default").unwrap().unwrap(), cred);
}

#[test]
fn store_overwrites_never_appends() {
    let (store, _dir, _) = temp_store();
    store.store("default", &sample_credential()).unwrap();

    let replacement = Credential {
        access_token: "AT2".to_string(),
        refresh_token: None,
        expires_at: 42,
    };
    store.store("default", &replacement).unwrap();
    assert_eq!(store.retrieve("default").unwrap().unwrap(), replacement);
}

#[test]
fn delete_removes_the_record() {
    let (store, _dir, _) = temp_store();
    store.store("default", &sample_credential()).unwrap();
    store.delete("default").unwrap();
    assert!(store.retrieve("default").unwrap().is_none());
}

#[test]
fn delete_absent_is_success() {
    let (store, _dir, _) = temp_store();
    store.delete("nonexistent").unwrap();
}

#[test]
fn records_survive_reopen() {
    let (store, _dir, path) = temp_store();
    let cred = sample_credential();
    store.store("default", &cred).unwrap();
    drop(store);

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.retrieve("default").unwrap().unwrap(), cred);
}

#[test]
fn undecodable_record_is_a_store_error_not_none() {
    let (store, _dir, path) = temp_store();
    store.store("default", &sample_credential()).unwrap();

    // Scribble over the record from a second connection
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE credentials SET data = 'not json' WHERE account = 'default'",
        [],
    )
    .unwrap();

    assert!(store.retrieve("default").is_err());
}
