//! In-process implementation of the gateway traits.
//!
//! Behaves like the hosted backend closely enough for store tests: ids
//! and `created_at` are assigned on insert, filters are equality filters,
//! and updates return the patched rows. Failures can be injected per
//! operation with [`MemoryGateway::fail`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::gateway::{
    AuthGateway, Filter, Query, SessionChanges, SignUpProfile, StorageGateway, TableGateway,
    UploadOptions,
};
use inkpost_core::session::{AuthSession, SessionUser};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::session_listeners::SessionListeners;

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Select,
    Insert,
    Update,
    Delete,
    Upload,
    Remove,
    SignIn,
    SignOut,
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: SessionUser,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    last_created_at: Option<DateTime<Utc>>,
    blobs: HashMap<(String, String), Vec<u8>>,
    removed: Vec<(String, String)>,
    accounts: HashMap<String, Account>,
    session: Option<AuthSession>,
    failures: HashMap<FailPoint, String>,
    calls: HashMap<FailPoint, usize>,
}

/// Gateway keeping every table, blob and account in memory.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
    listeners: SessionListeners,
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| InkpostError::gateway("memory gateway state poisoned"))
    }

    /// Makes every later call of `point` fail with `message`.
    pub fn fail(&self, point: FailPoint, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(point, message.into());
        }
    }

    /// Removes an injected failure.
    pub fn recover(&self, point: FailPoint) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.remove(&point);
        }
    }

    /// Number of calls made to `point`, successful or not.
    pub fn calls(&self, point: FailPoint) -> usize {
        self.state
            .lock()
            .map(|s| s.calls.get(&point).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Inserts a raw row as is. Missing ids are assigned.
    pub fn seed(&self, table: &str, mut row: Value) {
        if let Ok(mut state) = self.state.lock() {
            match row.get("id").and_then(Value::as_i64) {
                Some(id) => state.next_id = state.next_id.max(id),
                None => {
                    state.next_id += 1;
                    let id = state.next_id;
                    if let Some(obj) = row.as_object_mut() {
                        obj.insert("id".to_string(), Value::from(id));
                    }
                }
            }
            state.tables.entry(table.to_string()).or_default().push(row);
        }
    }

    /// Snapshot of a table's rows in storage order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .lock()
            .map(|s| s.tables.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Keys currently stored in `bucket`.
    pub fn blob_keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state
            .lock()
            .map(|s| {
                s.blobs
                    .keys()
                    .filter(|(b, _)| b == bucket)
                    .map(|(_, k)| k.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Every `(bucket, key)` a `remove` call was issued for, including
    /// calls that failed.
    pub fn removal_requests(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .map(|s| s.removed.clone())
            .unwrap_or_default()
    }

    /// Registers an account that can sign in.
    pub fn register(&self, email: &str, password: &str, full_name: Option<&str>) -> SessionUser {
        let user = SessionUser::new(
            uuid::Uuid::new_v4().to_string(),
            email,
            full_name.map(str::to_string),
        );
        if let Ok(mut state) = self.state.lock() {
            state.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    user: user.clone(),
                },
            );
        }
        user
    }

    /// Drops the current session as if its token had expired.
    pub fn expire_session(&self) {
        let had_session = self
            .state
            .lock()
            .map(|mut s| s.session.take().is_some())
            .unwrap_or_default();
        if had_session {
            self.listeners.publish(None);
        }
    }

    /// Re-issues the current session with a fresh token, as a token
    /// refresh would.
    pub fn refresh_session(&self) {
        let refreshed = self.state.lock().ok().and_then(|mut s| {
            let session = s.session.as_mut()?;
            session.access_token = uuid::Uuid::new_v4().to_string();
            Some(session.clone())
        });
        if let Some(session) = refreshed {
            self.listeners.publish(Some(session));
        }
    }

    /// Records a call and returns the injected failure for it, if any.
    fn check(state: &mut State, point: FailPoint) -> Result<()> {
        *state.calls.entry(point).or_default() += 1;
        match state.failures.get(&point) {
            Some(message) => Err(InkpostError::gateway(message.clone())),
            None => Ok(()),
        }
    }

    /// Insert-time timestamp, strictly increasing across inserts.
    fn next_created_at(state: &mut State) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match state.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        state.last_created_at = Some(created_at);
        created_at
    }

    fn open_session(&self, user: SessionUser) -> AuthSession {
        let session = AuthSession {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            user,
        };
        if let Ok(mut state) = self.state.lock() {
            state.session = Some(session.clone());
        }
        self.listeners.publish(Some(session.clone()));
        session
    }
}

#[async_trait]
impl TableGateway for MemoryGateway {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let mut state = self.lock()?;
        Self::check(&mut state, FailPoint::Select)?;

        let mut rows: Vec<Value> = state
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filter.as_ref().is_none_or(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let mut state = self.lock()?;
        Self::check(&mut state, FailPoint::Insert)?;

        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            let Some(obj) = row.as_object_mut() else {
                return Err(InkpostError::gateway("row must be a JSON object"));
            };
            state.next_id += 1;
            obj.insert("id".to_string(), Value::from(state.next_id));
            let created_at = Self::next_created_at(&mut state);
            obj.insert(
                "created_at".to_string(),
                Value::String(format_timestamp(created_at)),
            );
            inserted.push(row);
        }

        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        let mut state = self.lock()?;
        Self::check(&mut state, FailPoint::Update)?;

        let Some(changes) = patch.as_object() else {
            return Err(InkpostError::gateway("patch must be a JSON object"));
        };

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| filter.matches(row)) {
                if let Some(obj) = row.as_object_mut() {
                    for (column, value) in changes {
                        obj.insert(column.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        let mut state = self.lock()?;
        Self::check(&mut state, FailPoint::Delete)?;

        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| !filter.matches(row));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<()> {
        let mut state = self.lock()?;
        Self::check(&mut state, FailPoint::Upload)?;

        let slot = (bucket.to_string(), key.to_string());
        if !options.upsert && state.blobs.contains_key(&slot) {
            return Err(InkpostError::gateway("The resource already exists"));
        }
        state.blobs.insert(slot, bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{bucket}/{key}")
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()> {
        let mut state = self.lock()?;
        state
            .removed
            .extend(keys.iter().map(|k| (bucket.to_string(), k.clone())));
        Self::check(&mut state, FailPoint::Remove)?;

        for key in keys {
            state.blobs.remove(&(bucket.to_string(), key.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for MemoryGateway {
    async fn current_session(&self) -> Result<Option<AuthSession>> {
        Ok(self.lock()?.session.clone())
    }

    fn session_changes(&self) -> SessionChanges {
        self.listeners.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let user = {
            let mut state = self.lock()?;
            Self::check(&mut state, FailPoint::SignIn)?;
            match state.accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(InkpostError::gateway("Invalid login credentials")),
            }
        };
        Ok(self.open_session(user))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> Result<Option<AuthSession>> {
        if self.lock()?.accounts.contains_key(email) {
            return Err(InkpostError::gateway("User already registered"));
        }
        let user = self.register(email, password, profile.full_name.as_deref());
        Ok(Some(self.open_session(user)))
    }

    async fn sign_out(&self) -> Result<()> {
        let had_session = {
            let mut state = self.lock()?;
            Self::check(&mut state, FailPoint::SignOut)?;
            state.session.take().is_some()
        };
        if had_session {
            self.listeners.publish(None);
        }
        Ok(())
    }
}
