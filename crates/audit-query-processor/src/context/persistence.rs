//! One-file-per-session persistence, written atomically via a
//! temp-file-then-rename so a crash mid-write never corrupts a
//! session file.

use std::path::{Path, PathBuf};

use crate::config::PersistenceFormat;
use crate::context::session::ConversationContext;
use crate::metrics;

pub struct SessionStore {
    root: PathBuf,
    format: PersistenceFormat,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>, format: PersistenceFormat) -> Self {
        Self { root: root.into(), format }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.root.join(format!("{session_id}.{}", self.format.extension()))
    }

    pub fn ensure_root(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn write(&self, ctx: &ConversationContext) -> anyhow::Result<()> {
        let encoded = self.encode(ctx)?;
        let final_path = self.path_for(&ctx.session_id);
        let tmp_path = final_path.with_extension(format!("{}.tmp", self.format.extension()));
        std::fs::write(&tmp_path, encoded)?;
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    pub fn try_write(&self, ctx: &ConversationContext) {
        if let Err(err) = self.write(ctx) {
            tracing::warn!(session_id = %ctx.session_id, %err, "failed to persist session");
            metrics::inc_persistence_error("write");
        }
    }

    pub fn load_all(&self) -> anyhow::Result<Vec<ConversationContext>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut contexts = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.format.extension()) {
                continue;
            }
            match self.load_file(&path) {
                Ok(ctx) => contexts.push(ctx),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "failed to load session file");
                    metrics::inc_persistence_error("load");
                }
            }
        }
        Ok(contexts)
    }

    fn load_file(&self, path: &Path) -> anyhow::Result<ConversationContext> {
        let bytes = std::fs::read(path)?;
        self.decode(&bytes)
    }

    pub fn remove(&self, session_id: &str) {
        let path = self.path_for(session_id);
        if path.exists() {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::warn!(session_id, %err, "failed to remove session file");
                metrics::inc_persistence_error("remove");
            }
        }
    }

    fn encode(&self, ctx: &ConversationContext) -> anyhow::Result<Vec<u8>> {
        match self.format {
            PersistenceFormat::Json => Ok(serde_json::to_vec_pretty(ctx)?),
            PersistenceFormat::Gob => Ok(bincode::serialize(ctx)?),
        }
    }

    fn decode(&self, bytes: &[u8]) -> anyhow::Result<ConversationContext> {
        match self.format {
            PersistenceFormat::Json => Ok(serde_json::from_slice(bytes)?),
            PersistenceFormat::Gob => Ok(bincode::deserialize(bytes)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConversationContext {
        ConversationContext::new("s1".into(), 3600)
    }

    #[test]
    fn round_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), PersistenceFormat::Json);
        store.ensure_root().unwrap();
        let ctx = sample();
        store.write(&ctx).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].session_id, "s1");
    }

    #[test]
    fn round_trips_gob() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), PersistenceFormat::Gob);
        store.ensure_root().unwrap();
        let ctx = sample();
        store.write(&ctx).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), PersistenceFormat::Json);
        store.ensure_root().unwrap();
        store.write(&sample()).unwrap();
        store.remove("s1");
        assert!(store.load_all().unwrap().is_empty());
    }
}
