use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::users::UserIdentity;
use crate::domain::users::auth::domain::repositories::{
    AddUserOutcome, RefreshTokenRecord, RefreshTokenRepository, Revocation, UnitOfWork,
    UserRepository,
};
use crate::domain::users::value_objects::Email;

/// Thread-safe record store kept entirely in memory.
///
/// Implements every store port. Writes apply immediately, so `commit` only
/// counts calls (and can be told to fail). Call counters let tests assert
/// how often the lifecycle reached the store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    users: RwLock<HashMap<Uuid, UserIdentity>>,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
    mark_revoked_calls: AtomicUsize,
    revocations_applied: AtomicUsize,
    commits: AtomicUsize,
    fail_commits: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times `mark_revoked` was called, whether or not it changed anything.
    pub fn mark_revoked_calls(&self) -> usize {
        self.mark_revoked_calls.load(Ordering::SeqCst)
    }

    /// Times `mark_revoked` actually flipped a record to revoked.
    pub fn revocations_applied(&self) -> usize {
        self.revocations_applied.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Make every later `commit` fail until switched back off.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Refresh records belonging to `user_id`, oldest first.
    pub fn refresh_records_for(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        let mut records: Vec<_> = self
            .refresh_tokens
            .read()
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.created_at, record.id));
        records
    }
}

#[async_trait]
impl UserRepository for InMemoryRecordStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserIdentity>> {
        Ok(self.users.read().get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserIdentity>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| user.email().as_str().eq_ignore_ascii_case(email.as_str()))
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool> {
        Ok(self
            .users
            .read()
            .values()
            .any(|user| user.email().as_str().eq_ignore_ascii_case(email.as_str())))
    }

    async fn add(&self, user: &UserIdentity) -> Result<AddUserOutcome> {
        // Check and insert under one write lock so two registrations
        // cannot both pass the uniqueness check.
        let mut users = self.users.write();
        if users.contains_key(&user.id()) {
            bail!("user {} already exists", user.id());
        }
        if users
            .values()
            .any(|existing| existing.email().as_str().eq_ignore_ascii_case(user.email().as_str()))
        {
            return Ok(AddUserOutcome::EmailTaken);
        }
        users.insert(user.id(), user.clone());
        Ok(AddUserOutcome::Added)
    }

    async fn update(&self, user: &UserIdentity) -> Result<()> {
        let mut users = self.users.write();
        if users.values().any(|existing| {
            existing.id() != user.id()
                && existing.email().as_str().eq_ignore_ascii_case(user.email().as_str())
        }) {
            bail!("email {} is already registered", user.email());
        }
        match users.get_mut(&user.id()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => bail!("user {} does not exist", user.id()),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRecordStore {
    async fn add(&self, record: &RefreshTokenRecord) -> Result<()> {
        let mut tokens = self.refresh_tokens.write();
        if tokens.contains_key(&record.token_hash) {
            bail!("refresh token {} collides with an existing record", record.id);
        }
        tokens.insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>> {
        Ok(self.refresh_tokens.read().get(token_hash).cloned())
    }

    async fn mark_revoked(
        &self,
        token_hash: &str,
        revocation: Revocation,
    ) -> Result<bool> {
        self.mark_revoked_calls.fetch_add(1, Ordering::SeqCst);

        let mut tokens = self.refresh_tokens.write();
        let Some(record) = tokens.get_mut(token_hash) else {
            return Ok(false);
        };
        if record.revoked {
            return Ok(false);
        }

        record.revoked = true;
        record.revoked_at = Some(revocation.at);
        record.revoked_reason = Some(revocation.reason);
        record.replaced_by = revocation.replaced_by;
        self.revocations_applied.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revocation: Revocation,
    ) -> Result<u64> {
        let mut tokens = self.refresh_tokens.write();
        let mut revoked = 0;
        for record in tokens
            .values_mut()
            .filter(|record| record.user_id == user_id && !record.revoked)
        {
            record.revoked = true;
            record.revoked_at = Some(revocation.at);
            record.revoked_reason = Some(revocation.reason);
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryRecordStore {
    async fn commit(&self) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits.load(Ordering::SeqCst) {
            bail!("commit rejected by record store");
        }
        Ok(())
    }
}
