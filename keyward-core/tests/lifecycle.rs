use std::sync::Arc;

use chrono::{Duration, Utc};
use keyward_core::{
    CredentialLifecycleService, Email, HasherSettings, InMemoryRecordStore,
    LifecycleError, PasswordHasher, RefreshToken, RefreshTokenRecord,
    RefreshTokenRepository, RegisterCommand, RevocationReason, TokenIssuer,
    TokenSettings, UserRepository,
};
use uuid::Uuid;

const PASSWORD: &str = "Password@123";

fn hasher(iterations: u32) -> Arc<PasswordHasher> {
    Arc::new(PasswordHasher::new(HasherSettings::pbkdf2(iterations)).unwrap())
}

fn service_with(
    store: &Arc<InMemoryRecordStore>,
    hasher: Arc<PasswordHasher>,
) -> CredentialLifecycleService {
    let issuer = TokenIssuer::new(
        TokenSettings::new(
            "integration-signing-secret-of-sufficient-length",
            "keyward",
            "keyward-clients",
            15,
            7,
        )
        .unwrap(),
    );
    CredentialLifecycleService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        hasher,
        Arc::new(issuer),
    )
}

fn setup() -> (Arc<InMemoryRecordStore>, CredentialLifecycleService) {
    let store = Arc::new(InMemoryRecordStore::new());
    let service = service_with(&store, hasher(1_000));
    (store, service)
}

fn registration(email: &str) -> RegisterCommand {
    RegisterCommand {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        street: "12 St James's Square".into(),
        city: "London".into(),
        postal_code: "SW1Y 4JH".into(),
        country: "United Kingdom".into(),
        email: email.into(),
        phone: "+442071234567".into(),
        password: PASSWORD.into(),
    }
}

fn assert_unauthorized<T: std::fmt::Debug>(result: Result<T, LifecycleError>) {
    match result {
        Err(err @ LifecycleError::Unauthorized) => {
            assert_eq!(err.to_string(), "Invalid credentials")
        }
        other => panic!("expected unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn register_then_login() {
    let (store, service) = setup();

    let registered = service.register(registration("Ada@Example.com")).await.unwrap();
    assert!(!registered.access_token.is_empty());
    assert!(registered.expires_at > Utc::now());
    assert_eq!(store.user_count(), 1);
    assert_eq!(store.refresh_records_for(registered.user_id).len(), 1);

    let logged_in = service.login("ada@example.com", PASSWORD).await.unwrap();
    assert_eq!(logged_in.user_id, registered.user_id);
    assert_ne!(logged_in.refresh_token, registered.refresh_token);

    // Concurrent sessions are allowed: the first refresh token still works.
    assert_eq!(store.refresh_records_for(registered.user_id).len(), 2);
    service
        .refresh_token(registered.refresh_token.as_str())
        .await
        .unwrap();
}

#[tokio::test]
async fn login_records_last_login() {
    let (store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();

    service.login("ada@example.com", PASSWORD).await.unwrap();

    let user = store.find_by_id(registered.user_id).await.unwrap().unwrap();
    assert!(user.last_login_at().is_some());
}

#[tokio::test]
async fn duplicate_email_differing_by_case_conflicts() {
    let (store, service) = setup();
    service.register(registration("ada@example.com")).await.unwrap();

    let err = service
        .register(registration("ADA@Example.COM"))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(_)));
    assert_eq!(store.user_count(), 1);
}

#[tokio::test]
async fn weak_password_fails_registration_citing_length() {
    let (store, service) = setup();
    let mut command = registration("ada@example.com");
    command.password = "Sh0rt!".into();

    match service.register(command).await {
        Err(LifecycleError::Validation(err)) => {
            assert_eq!(err.field(), "password");
            assert_eq!(err.to_string(), "password must be at least 10 characters");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(store.user_count(), 0);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_identical() {
    let (_store, service) = setup();
    service.register(registration("ada@example.com")).await.unwrap();

    let ghost = service.login("ghost@x.com", "whatever").await.unwrap_err();
    let wrong = service
        .login("ada@example.com", "Password@124")
        .await
        .unwrap_err();

    assert_eq!(ghost.to_string(), "Invalid credentials");
    assert_eq!(ghost.to_string(), wrong.to_string());
    assert_unauthorized(service.login("ada@example.com", "").await);
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let (store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();
    let token_a = registered.refresh_token;

    let rotated = service.refresh_token(token_a.as_str()).await.unwrap();
    let token_b = rotated.refresh_token;
    assert_ne!(token_a, token_b);

    assert_unauthorized(service.refresh_token(token_a.as_str()).await);

    service.refresh_token(token_b.as_str()).await.unwrap();
    assert_unauthorized(service.refresh_token(token_b.as_str()).await);

    let records = store.refresh_records_for(registered.user_id);
    assert_eq!(records.len(), 3);
    let first = store
        .find_by_hash(&token_a.digest())
        .await
        .unwrap()
        .unwrap();
    let second = store
        .find_by_hash(&token_b.digest())
        .await
        .unwrap()
        .unwrap();
    assert!(first.revoked);
    assert_eq!(first.revoked_reason, Some(RevocationReason::Rotation));
    assert_eq!(first.replaced_by, Some(second.id));
}

#[tokio::test]
async fn stored_records_never_hold_the_plain_token() {
    let (store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();

    for record in store.refresh_records_for(registered.user_id) {
        assert_ne!(record.token_hash, registered.refresh_token.as_str());
        assert_eq!(record.token_hash, registered.refresh_token.digest());
    }
}

#[tokio::test]
async fn expired_refresh_token_is_rejected() {
    let (store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();

    let now = Utc::now();
    let expired = RefreshTokenRecord::new(
        registered.user_id,
        RefreshToken::from_value("expired-token").unwrap().digest(),
        now - Duration::days(8),
        now - Duration::days(1),
    );
    RefreshTokenRepository::add(store.as_ref(), &expired).await.unwrap();

    assert_unauthorized(service.refresh_token("expired-token").await);
    assert_unauthorized(service.refresh_token("never-issued").await);
    assert_unauthorized(service.refresh_token("   ").await);
}

#[tokio::test]
async fn revoke_is_idempotent_and_writes_once() {
    let (store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();
    let token = registered.refresh_token.as_str();
    let commits_before = store.commits();

    service.revoke_token(token).await.unwrap();
    service.revoke_token(token).await.unwrap();

    assert_eq!(store.mark_revoked_calls(), 1);
    assert_eq!(store.commits(), commits_before + 1);
    assert_unauthorized(service.refresh_token(token).await);

    // Unknown tokens are a silent no-op.
    service.revoke_token("never-issued").await.unwrap();
    service.revoke_token("").await.unwrap();
    assert_eq!(store.mark_revoked_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refresh_with_one_token_succeeds_once() {
    let (store, service) = setup();
    let service = Arc::new(service);
    let registered = service.register(registration("ada@example.com")).await.unwrap();
    let token = registered.refresh_token.into_string();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let token = token.clone();
            tokio::spawn(async move { service.refresh_token(&token).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LifecycleError::Unauthorized) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(store.revocations_applied(), 1);
    // Original plus exactly one successor.
    assert_eq!(store.refresh_records_for(registered.user_id).len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_with_one_email_conflict() {
    let (store, service) = setup();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            // Same address, different casing.
            let email = if i % 2 == 0 {
                "ada@example.com"
            } else {
                "ADA@Example.com"
            };
            tokio::spawn(async move { service.register(registration(email)).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LifecycleError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(store.user_count(), 1);
}

#[tokio::test]
async fn change_password_revokes_every_session() {
    let (store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();
    let second = service.login("ada@example.com", PASSWORD).await.unwrap();

    service
        .change_password(registered.user_id, PASSWORD, "N3w-Passphrase")
        .await
        .unwrap();

    assert_unauthorized(service.refresh_token(registered.refresh_token.as_str()).await);
    assert_unauthorized(service.refresh_token(second.refresh_token.as_str()).await);
    assert!(
        store
            .refresh_records_for(registered.user_id)
            .iter()
            .all(|record| record.revoked_reason == Some(RevocationReason::PasswordChange))
    );

    assert_unauthorized(service.login("ada@example.com", PASSWORD).await);
    service.login("ada@example.com", "N3w-Passphrase").await.unwrap();
}

#[tokio::test]
async fn change_password_error_paths() {
    let (_store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();

    let missing = Uuid::now_v7();
    match service.change_password(missing, PASSWORD, "N3w-Passphrase").await {
        Err(LifecycleError::NotFound { entity, id }) => {
            assert_eq!(entity, "user");
            assert_eq!(id, missing);
        }
        other => panic!("expected not found, got {other:?}"),
    }

    assert_unauthorized(
        service
            .change_password(registered.user_id, "Wrong@Pass123", "N3w-Passphrase")
            .await,
    );

    assert!(matches!(
        service
            .change_password(registered.user_id, PASSWORD, "weak")
            .await,
        Err(LifecycleError::Validation(_))
    ));

    // Nothing changed: the original password still works.
    service.login("ada@example.com", PASSWORD).await.unwrap();
}

#[tokio::test]
async fn revoke_all_sessions_reports_count() {
    let (_store, service) = setup();
    let registered = service.register(registration("ada@example.com")).await.unwrap();
    service.login("ada@example.com", PASSWORD).await.unwrap();
    service.login("ada@example.com", PASSWORD).await.unwrap();

    assert_eq!(service.revoke_all_sessions(registered.user_id).await.unwrap(), 3);
    assert_eq!(service.revoke_all_sessions(registered.user_id).await.unwrap(), 0);
    assert!(matches!(
        service.revoke_all_sessions(Uuid::now_v7()).await,
        Err(LifecycleError::NotFound { .. })
    ));
}

#[tokio::test]
async fn login_upgrades_outdated_credentials() {
    let store = Arc::new(InMemoryRecordStore::new());
    let legacy = service_with(&store, hasher(1_000));
    let registered = legacy.register(registration("ada@example.com")).await.unwrap();

    let current_hasher = hasher(2_000);
    let current = service_with(&store, current_hasher.clone());
    current.login("ada@example.com", PASSWORD).await.unwrap();

    let user = store.find_by_id(registered.user_id).await.unwrap().unwrap();
    assert_eq!(user.credential().iterations(), 2_000);
    assert!(!current_hasher.needs_rehash(user.credential()));
    current.login("ada@example.com", PASSWORD).await.unwrap();
}

#[tokio::test]
async fn commit_failures_propagate_as_store_errors() {
    let (store, service) = setup();
    store.fail_commits(true);

    match service.register(registration("ada@example.com")).await {
        Err(LifecycleError::Store(err)) => {
            assert_eq!(err.to_string(), "commit rejected by record store")
        }
        other => panic!("expected store error, got {other:?}"),
    }
}

#[tokio::test]
async fn email_lookup_is_normalized() {
    let (store, service) = setup();
    service.register(registration("  Ada@Example.com ")).await.unwrap();

    let email = Email::parse("ADA@EXAMPLE.COM").unwrap();
    assert!(store.exists_by_email(&email).await.unwrap());
    service.login(" ADA@example.com ", PASSWORD).await.unwrap();
}
