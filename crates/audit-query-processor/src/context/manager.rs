//! Owns sessions, resolves references, bounds memory, and optionally
//! persists to disk. Sessions live in a `DashMap` the way the
//! teacher's `ConversationHierarchy` holds its session table.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::context::persistence::SessionStore;
use crate::context::pronoun::resolve_pronouns;
use crate::context::session::{extract_references, now_epoch_secs, ConversationContext, ConversationEntry};
use crate::domain::query::StructuredQuery;
use crate::metrics;

pub struct ContextManager {
    sessions: DashMap<String, Arc<RwLock<ConversationContext>>>,
    config: Arc<AppConfig>,
    store: Option<SessionStore>,
    active_count: AtomicI64,
}

impl ContextManager {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let store = if config.enable_persistence {
            Some(SessionStore::new(config.persistence_path.clone(), config.persistence_format))
        } else {
            None
        };

        Self {
            sessions: DashMap::new(),
            config,
            store,
            active_count: AtomicI64::new(0),
        }
    }

    /// Loads all persisted session files into memory. No-op when
    /// persistence is disabled.
    pub async fn load_from_disk(&self) -> anyhow::Result<()> {
        let Some(store) = &self.store else { return Ok(()) };
        store.ensure_root()?;
        for ctx in store.load_all()? {
            let session_id = ctx.session_id.clone();
            self.sessions.insert(session_id, Arc::new(RwLock::new(ctx)));
        }
        self.refresh_active_count();
        Ok(())
    }

    fn refresh_active_count(&self) {
        self.active_count.store(self.sessions.len() as i64, Ordering::Relaxed);
        metrics::set_active_sessions(self.sessions.len() as i64);
    }

    /// Atomic get-or-insert: two concurrent first requests for the same
    /// brand-new `session_id` must never race each other into creating
    /// (and one of them orphaning) two separate contexts.
    async fn get_or_create(&self, session_id: &str) -> Arc<RwLock<ConversationContext>> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let created = Arc::new(RwLock::new(ConversationContext::new(
                    session_id.to_string(),
                    self.config.session_timeout.as_secs(),
                )));
                entry.insert(created.clone());
                self.refresh_active_count();
                created
            }
        }
    }

    /// Returns the query unmodified if no session exists yet.
    pub async fn resolve_pronouns(&self, query: &str, session_id: &str) -> String {
        let Some(session) = self.sessions.get(session_id) else {
            return query.to_string();
        };
        let ctx = session.read().await;
        resolve_pronouns(query, &ctx.references, &self.config.crd_acronym)
    }

    pub async fn update(&self, session_id: &str, query: &str, structured_query: &StructuredQuery) {
        self.update_with_user(session_id, None, query, structured_query).await;
    }

    pub async fn update_with_user(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        query: &str,
        structured_query: &StructuredQuery,
    ) {
        let session = self.get_or_create(session_id).await;
        let mut ctx = session.write().await;

        if let Some(raw) = user_id {
            ctx.user_id = sanitize_user_id(raw);
        }

        ctx.entries.push(ConversationEntry {
            query: query.to_string(),
            structured_query: structured_query.clone(),
            recorded_at_epoch_secs: now_epoch_secs(),
        });

        for (key, value) in extract_references(structured_query) {
            ctx.references.insert(key, value);
        }

        ctx.touch(self.config.session_timeout.as_secs());

        if self.config.enable_persistence && !self.config.enable_async_persistence {
            if let Some(store) = &self.store {
                store.try_write(&ctx);
                ctx.dirty = false;
            }
        }

        drop(ctx);
        self.enforce_bounds().await;
    }

    pub async fn get(&self, session_id: &str) -> anyhow::Result<ConversationContext> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| anyhow::anyhow!("session not found"))?;
        Ok(session.read().await.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub async fn clear_all(&self) {
        self.sessions.clear();
        self.refresh_active_count();
    }

    /// Flushes every dirty session to disk; used by the background
    /// flusher in async-persistence mode and by `close()`.
    pub async fn flush_dirty(&self) {
        let Some(store) = &self.store else { return };
        let session_ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for session_id in session_ids {
            let Some(session) = self.sessions.get(&session_id) else { continue };
            let mut ctx = session.write().await;
            if ctx.dirty {
                store.try_write(&ctx);
                ctx.dirty = false;
            }
        }
    }

    /// Removes sessions whose `expires_at` has passed, from memory
    /// and from disk. Returns the number removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = now_epoch_secs();
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            if entry.value().read().await.is_expired(now) {
                expired.push(entry.key().clone());
            }
        }
        for session_id in &expired {
            self.sessions.remove(session_id);
            if let Some(store) = &self.store {
                store.remove(session_id);
            }
        }
        self.refresh_active_count();
        expired.len()
    }

    /// Forced sweep invoked by the memory monitor on a critical
    /// threshold breach: expires what it can, then trims to bounds.
    pub async fn force_sweep(&self) {
        self.sweep_expired().await;
        self.enforce_bounds().await;
    }

    /// Evicts least-recently-used sessions until both `max_sessions`
    /// and `max_memory_mb` are satisfied.
    async fn enforce_bounds(&self) {
        loop {
            let count = self.sessions.len();
            let mut total_bytes: usize = 0;
            let mut by_activity: Vec<(String, u64)> = Vec::with_capacity(count);

            for entry in self.sessions.iter() {
                let ctx = entry.value().read().await;
                total_bytes += ctx.approx_size_bytes();
                by_activity.push((entry.key().clone(), ctx.last_activity_epoch_secs));
            }

            let over_count = count > self.config.max_sessions;
            let over_memory = total_bytes > self.config.max_memory_mb * 1024 * 1024;

            if !over_count && !over_memory {
                self.refresh_active_count();
                return;
            }

            by_activity.sort_by_key(|(_, last_activity)| *last_activity);
            let Some((lru_session, _)) = by_activity.first() else {
                return;
            };

            self.sessions.remove(lru_session);
            if let Some(store) = &self.store {
                store.remove(lru_session);
            }
        }
    }

    /// Stops background workers (via the caller's shutdown signal) and
    /// flushes every dirty session.
    pub async fn close(&self) {
        self.flush_dirty().await;
    }
}

/// trim, reject control characters and anything outside
/// `[A-Za-z0-9._@-]`, length <= 256; invalid input is treated as
/// absent.
fn sanitize_user_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > 256 {
        return None;
    }
    let valid = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-'));
    if valid {
        Some(trimmed.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_support::test_config;

    #[tokio::test]
    async fn update_creates_session_and_references() {
        let manager = ContextManager::new(Arc::new(test_config()));
        let mut q = StructuredQuery::default();
        q.verb = Some("delete".into());
        manager.update("s1", "delete pods", &q).await;
        assert_eq!(manager.session_count(), 1);
        let ctx = manager.get("s1").await.unwrap();
        assert_eq!(ctx.references.get("last_action").unwrap().value, "delete");
    }

    #[tokio::test]
    async fn resolve_pronouns_is_noop_without_session() {
        let manager = ContextManager::new(Arc::new(test_config()));
        assert_eq!(manager.resolve_pronouns("did he do it", "missing").await, "did he do it");
    }

    #[tokio::test]
    async fn get_fails_for_missing_session() {
        let manager = ContextManager::new(Arc::new(test_config()));
        assert!(manager.get("nope").await.is_err());
    }

    #[tokio::test]
    async fn sanitize_rejects_invalid_user_id() {
        assert_eq!(sanitize_user_id("bad user!"), None);
        assert_eq!(sanitize_user_id("  alice@example.com "), Some("alice@example.com".to_string()));
    }
}
