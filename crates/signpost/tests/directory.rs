//! End-to-end tests: raw request bodies through `Directory::handle`.

use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use signpost::{Directory, DirectoryConfig, RequestContext};
use signpost_core::{Authority, Ed25519Signature};
use signpost_store::{DirectoryStore, MemoryStore, SqliteStore, UpsertOutcome};
use signpost_testkit::{memorabilia_for, new_record, Client};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn sandbox_config() -> DirectoryConfig {
    DirectoryConfig {
        registration_domain: "example.net".to_string(),
        sandbox: true,
        ..DirectoryConfig::default()
    }
}

fn directory() -> Directory<MemoryStore> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Directory::new(Authority::from_seed([11; 32]), MemoryStore::new(), sandbox_config())
}

fn ctx() -> RequestContext {
    RequestContext {
        source: IpAddr::from([127, 0, 0, 1]),
        secure: true,
    }
}

async fn run(directory: &Directory<MemoryStore>, body: &str) -> Value {
    directory.handle(body, &ctx()).await.into_value()
}

#[tokio::test]
async fn publish_then_lookup() {
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    let response = run(&directory, &client.publish_request(
        &Authority::from_seed([11; 32]),
        "Echo",
        now_secs(),
    ))
    .await;
    assert_eq!(response["c"], 0);
    assert!(response["password"].is_string());

    // Names are stored lowercase; lookup without a domain hits home.
    let response = run(&directory, &json!({"action": 3, "name": "echo"}).to_string()).await;
    assert_eq!(response["c"], 0);
    assert_eq!(response["name"], "echo");
    assert_eq!(response["regdomain"], "example.net");
    assert_eq!(response["url"], "tox:echo@example.net");
    assert_eq!(response["tox_id"], client.identity([0, 0, 0, 0]).to_hex());
    assert_eq!(response["verify"]["status"], 1);
    assert_eq!(response["verify"]["detail"], "Good (signed by local authority)");
    assert_eq!(response["version"], "Tox V3 (local)");

    // The full address form works too.
    let response = run(
        &directory,
        &json!({"action": 3, "name": "echo@example.net"}).to_string(),
    )
    .await;
    assert_eq!(response["c"], 0);
}

#[tokio::test]
async fn lookup_signature_verifies_against_authority() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);
    run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;

    let response = run(&directory, &json!({"action": 3, "name": "echo"}).to_string()).await;
    let message = signpost_core::canonical_record_bytes(
        "echo",
        &client.identity([0, 0, 0, 0]).public_key_hex(),
        "00000000",
        &client.identity([0, 0, 0, 0]).checksum_hex(),
    )
    .unwrap();
    let signature =
        Ed25519Signature::from_base64(response["signature"].as_str().unwrap()).unwrap();
    authority.verify_key().verify(&message, &signature).unwrap();
}

#[tokio::test]
async fn republish_is_idempotent_and_keeps_password() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    let first = run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;
    let password = first["password"].as_str().unwrap().to_string();

    let second = run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;
    assert_eq!(second["c"], 0);
    assert!(second["password"].is_null());

    // The original password still authenticates.
    directory.authenticate("echo", &password).await.unwrap();
}

#[tokio::test]
async fn name_taken_by_other_client() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();

    let first = Client::from_seed([1; 32]);
    run(&directory, &first.publish_request(&authority, "echo", now_secs())).await;

    let second = Client::from_seed([2; 32]);
    let response = run(&directory, &second.publish_request(&authority, "echo", now_secs())).await;
    assert_eq!(response["c"], -25);
}

#[tokio::test]
async fn same_identity_cannot_take_second_name() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;
    let response = run(&directory, &client.publish_request(&authority, "foxtrot", now_secs())).await;
    assert_eq!(response["c"], -26);
}

#[tokio::test]
async fn unpublish_releases_the_name() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);
    run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;

    let payload = json!({
        "public_key": client.identity([0, 0, 0, 0]).public_key_hex(),
        "timestamp": now_secs(),
    });
    let response = run(&directory, &client.request(&authority, 2, &payload)).await;
    assert_eq!(response["c"], 0);

    let response = run(&directory, &json!({"action": 3, "name": "echo"}).to_string()).await;
    assert_eq!(response["c"], -30);

    // Releasing again still answers ok.
    let payload = json!({
        "public_key": client.identity([0, 0, 0, 0]).public_key_hex(),
        "timestamp": now_secs(),
    });
    let response = run(&directory, &client.request(&authority, 2, &payload)).await;
    assert_eq!(response["c"], 0);
}

#[tokio::test]
async fn reverse_lookup() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);
    run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;

    let key = client.identity([0, 0, 0, 0]).public_key_hex();
    let response = run(&directory, &json!({"action": 5, "id": key}).to_string()).await;
    assert_eq!(response["c"], 0);
    assert_eq!(response["name"], "echo");

    // Lowercase input resolves too.
    let response =
        run(&directory, &json!({"action": 5, "id": key.to_lowercase()}).to_string()).await;
    assert_eq!(response["c"], 0);

    let response =
        run(&directory, &json!({"action": 5, "id": "F".repeat(64)}).to_string()).await;
    assert_eq!(response["c"], -30);

    let response = run(&directory, &json!({"action": 5, "id": "short"}).to_string()).await;
    assert_eq!(response["c"], -3);
}

#[tokio::test]
async fn search_returns_discoverable_records_only() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();

    let visible = Client::from_seed([1; 32]);
    run(&directory, &visible.publish_request(&authority, "echo-visible", now_secs())).await;

    let hidden = Client::from_seed([2; 32]);
    let payload = json!({
        "tox_id": hidden.identity([0, 0, 0, 0]).to_hex(),
        "name": "echo-hidden",
        "timestamp": now_secs(),
        "privacy": 1,
        "bio": "not listed",
    });
    let response = run(&directory, &hidden.request(&authority, 1, &payload)).await;
    assert_eq!(response["c"], 0);

    let response =
        run(&directory, &json!({"action": 6, "name": "echo", "page": 0}).to_string()).await;
    assert_eq!(response["c"], 0);
    let users = response["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "echo-visible");

    // Pages past the results are empty, not errors.
    let response =
        run(&directory, &json!({"action": 6, "name": "echo", "page": 7}).to_string()).await;
    assert_eq!(response["c"], 0);
    assert!(response["users"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_rejects_empty_and_oversized_queries() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);
    run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;

    // An empty query must not dump the whole directory.
    let response = run(&directory, &json!({"action": 6, "name": "", "page": 0}).to_string()).await;
    assert_eq!(response["c"], -28);

    let long = "a".repeat(64);
    let response =
        run(&directory, &json!({"action": 6, "name": long, "page": 0}).to_string()).await;
    assert_eq!(response["c"], -28);
}

#[tokio::test]
async fn negative_privacy_clamps_to_discoverable() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    let payload = json!({
        "tox_id": client.identity([0, 0, 0, 0]).to_hex(),
        "name": "echo",
        "timestamp": now_secs(),
        "privacy": -5,
        "bio": "",
    });
    let response = run(&directory, &client.request(&authority, 1, &payload)).await;
    assert_eq!(response["c"], 0);

    let response =
        run(&directory, &json!({"action": 6, "name": "echo", "page": 0}).to_string()).await;
    assert_eq!(response["c"], 0);
    let users = response["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "echo");
}

#[tokio::test]
async fn status_reports_fuzzed_counters() {
    let directory = directory();
    let response = run(&directory, &json!({"action": 4}).to_string()).await;
    assert_eq!(response["c"], 0);
    assert!(response["ut"].is_u64());
    assert_eq!(response["rs"].as_u64().unwrap() % 100, 0);
    assert_eq!(response["uc"].as_u64().unwrap() % 100, 0);
}

#[tokio::test]
async fn stale_timestamps_rejected() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    let response =
        run(&directory, &client.publish_request(&authority, "late", now_secs() - 301)).await;
    assert_eq!(response["c"], -3);

    let response =
        run(&directory, &client.publish_request(&authority, "ontime", now_secs() - 299)).await;
    assert_eq!(response["c"], 0);
}

#[tokio::test]
async fn invalid_names_rejected() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    let response = run(&directory, &client.publish_request(&authority, "has space", now_secs())).await;
    assert_eq!(response["c"], -27);

    let response = run(&directory, &client.publish_request(&authority, "api", now_secs())).await;
    assert_eq!(response["c"], -28);
}

#[tokio::test]
async fn tampered_envelopes_all_answer_bad_payload() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    let body = client.publish_request(&authority, "echo", now_secs());
    let envelope: Value = serde_json::from_str(&body).unwrap();

    let mut bad_key = envelope.clone();
    bad_key["public_key"] = Value::String("zz".repeat(32));
    let mut bad_nonce = envelope.clone();
    bad_nonce["nonce"] = Value::String("AAAA".to_string());
    let mut bad_ct = envelope.clone();
    bad_ct["encrypted"] = Value::String("Z2FyYmFnZQ==".to_string());

    for broken in [bad_key, bad_nonce, bad_ct] {
        let response = run(&directory, &broken.to_string()).await;
        assert_eq!(response["c"], -3);
    }
}

#[tokio::test]
async fn malformed_bodies_and_unknown_actions() {
    let directory = directory();

    assert_eq!(run(&directory, "not json").await["c"], -3);
    assert_eq!(run(&directory, "[1, 2]").await["c"], -3);
    assert_eq!(run(&directory, r#"{"no_action": true}"#).await["c"], -3);
    assert_eq!(run(&directory, r#"{"action": 99}"#).await["c"], -1);
}

#[tokio::test]
async fn insecure_transport_rejected_outside_sandbox_config() {
    let config = DirectoryConfig {
        registration_domain: "example.net".to_string(),
        sandbox: true,
        secure_mode: true,
        ..DirectoryConfig::default()
    };
    let directory = Directory::new(Authority::from_seed([11; 32]), MemoryStore::new(), config);

    let insecure = RequestContext {
        source: IpAddr::from([127, 0, 0, 1]),
        secure: false,
    };
    let response = directory
        .handle(&json!({"action": 4}).to_string(), &insecure)
        .await
        .into_value();
    assert_eq!(response["c"], -2);
}

#[tokio::test]
async fn rate_limit_trips_on_the_fourteenth_publish() {
    let authority = Authority::from_seed([11; 32]);
    let config = DirectoryConfig {
        registration_domain: "example.net".to_string(),
        sandbox: false,
        ..DirectoryConfig::default()
    };
    let directory = Directory::new(Authority::from_seed([11; 32]), MemoryStore::new(), config);
    let client = Client::from_seed([1; 32]);

    for i in 0..13 {
        let response = directory
            .handle(&client.publish_request(&authority, &format!("user{i}"), now_secs()), &ctx())
            .await
            .into_value();
        assert_ne!(response["c"], -4, "attempt {i} should not be throttled");
    }

    let response = directory
        .handle(&client.publish_request(&authority, "user13", now_secs()), &ctx())
        .await
        .into_value();
    assert_eq!(response["c"], -4);

    // Lookups are not rate limited.
    let response = directory
        .handle(&json!({"action": 3, "name": "user0"}).to_string(), &ctx())
        .await
        .into_value();
    assert_ne!(response["c"], -4);
}

#[tokio::test]
async fn memorabilia_binds_every_response() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let random = [0x42u8; 64];

    let mut envelope = json!({"action": 4});
    envelope["memorabilia"] = Value::String(memorabilia_for(&random));
    let response = run(&directory, &envelope.to_string()).await;
    assert_eq!(response["c"], 0);

    let signature =
        Ed25519Signature::from_base64(response["signed_memorabilia"].as_str().unwrap()).unwrap();
    authority.verify_key().verify(&random, &signature).unwrap();

    // Attached to failures too.
    let mut envelope = json!({"action": 3, "name": "nobody"});
    envelope["memorabilia"] = Value::String(memorabilia_for(&random));
    let response = run(&directory, &envelope.to_string()).await;
    assert_eq!(response["c"], -30);
    assert!(response["signed_memorabilia"].is_string());

    // Wrong-length memorabilia is ignored, not fatal.
    let mut envelope = json!({"action": 4});
    envelope["memorabilia"] = Value::String("AAAA".to_string());
    let response = run(&directory, &envelope.to_string()).await;
    assert_eq!(response["c"], 0);
    assert!(response.get("signed_memorabilia").is_none());
}

#[tokio::test]
async fn management_surface_authenticates_and_removes() {
    let authority = Authority::from_seed([11; 32]);
    let directory = directory();
    let client = Client::from_seed([1; 32]);

    let response = run(&directory, &client.publish_request(&authority, "echo", now_secs())).await;
    let password = response["password"].as_str().unwrap().to_string();

    assert!(directory.authenticate("echo", "wrong").await.is_err());
    directory.remove("echo", &password).await.unwrap();

    let response = run(&directory, &json!({"action": 3, "name": "echo"}).to_string()).await;
    assert_eq!(response["c"], -30);
}

#[tokio::test]
async fn foreign_domain_lookup_fails() {
    let directory = directory();
    let response = run(
        &directory,
        &json!({"action": 3, "name": "someone@elsewhere.org"}).to_string(),
    )
    .await;
    assert_eq!(response["c"], -41);

    let response = run(&directory, &json!({"action": 3, "name": "@echo"}).to_string()).await;
    assert_eq!(response["c"], -3);
}

#[tokio::test]
async fn concurrent_registrations_of_one_name_yield_one_owner() {
    let store = std::sync::Arc::new(SqliteStore::open_memory().unwrap());

    let mut handles = Vec::new();
    for seed in 1..=8u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.upsert(new_record("contested", seed)).await.unwrap()
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            UpsertOutcome::Created => created += 1,
            UpsertOutcome::NameTaken => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(created, 1);

    let record = store.get_by_name("contested").await.unwrap().unwrap();
    assert_eq!(record.name, "contested");
}
