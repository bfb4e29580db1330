//! services/audiobook/src/adapters/session_store.rs
//!
//! In-memory implementation of the `SessionStore` port.
//!
//! Sessions live only as long as the process. An entry is evicted once it has
//! been idle longer than the TTL, and when the store is full the least
//! recently used entry makes room for a new one.

use async_trait::async_trait;
use audiobook_core::domain::UploadSession;
use audiobook_core::ports::{Admission, PortError, PortResult, SessionStore};
use chrono::{DateTime, Duration as IdleDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

struct Entry {
    session: Arc<UploadSession>,
    last_accessed_at: DateTime<Utc>,
}

pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    /// `None` disables idle expiry.
    ttl: Option<IdleDuration>,
    /// Zero means unbounded.
    capacity: usize,
}

impl InMemorySessionStore {
    /// A TTL of zero disables expiry; a capacity of zero disables the size bound.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let ttl = if ttl.is_zero() {
            None
        } else {
            IdleDuration::from_std(ttl).ok()
        };
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        self.ttl
            .is_some_and(|ttl| now.signed_duration_since(entry.last_accessed_at) > ttl)
    }

    fn take_expired(&self, sessions: &mut HashMap<Uuid, Entry>, now: DateTime<Utc>) -> Vec<Arc<UploadSession>> {
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(id, _)| *id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| sessions.remove(&id))
            .map(|entry| {
                debug!(
                    upload_id = %entry.session.id,
                    age_secs = now.signed_duration_since(entry.session.created_at).num_seconds(),
                    "Session expired"
                );
                entry.session
            })
            .collect()
    }

    async fn insert_at(&self, session: UploadSession, now: DateTime<Utc>) -> Admission {
        let mut sessions = self.sessions.lock().await;

        let mut evicted = Vec::new();
        if self.capacity > 0 && sessions.len() >= self.capacity {
            evicted = self.take_expired(&mut sessions, now);
        }
        while self.capacity > 0 && sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed_at)
                .map(|(id, _)| *id)
            else {
                break;
            };
            if let Some(entry) = sessions.remove(&oldest) {
                debug!(
                    upload_id = %oldest,
                    age_secs = now.signed_duration_since(entry.session.created_at).num_seconds(),
                    "Evicted least recently used session"
                );
                evicted.push(entry.session);
            }
        }

        let session = Arc::new(session);
        sessions.insert(
            session.id,
            Entry {
                session: session.clone(),
                last_accessed_at: now,
            },
        );
        Admission { session, evicted }
    }

    async fn get_at(&self, id: Uuid, now: DateTime<Utc>) -> PortResult<Arc<UploadSession>> {
        let mut sessions = self.sessions.lock().await;
        let expired = match sessions.get(&id) {
            None => return Err(PortError::NotFound(format!("upload session {id}"))),
            Some(entry) => self.is_expired(entry, now),
        };
        if expired {
            sessions.remove(&id);
            debug!(upload_id = %id, "Session expired on access");
            return Err(PortError::NotFound(format!("upload session {id}")));
        }

        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| PortError::NotFound(format!("upload session {id}")))?;
        entry.last_accessed_at = now;
        Ok(entry.session.clone())
    }

    async fn evict_expired_at(&self, now: DateTime<Utc>) -> Vec<Arc<UploadSession>> {
        let mut sessions = self.sessions.lock().await;
        let evicted = self.take_expired(&mut sessions, now);
        if !evicted.is_empty() {
            info!(evicted = evicted.len(), remaining = sessions.len(), "Evicted idle upload sessions");
        }
        evicted
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: UploadSession) -> PortResult<Admission> {
        Ok(self.insert_at(session, Utc::now()).await)
    }

    async fn get(&self, id: Uuid) -> PortResult<Arc<UploadSession>> {
        self.get_at(id, Utc::now()).await
    }

    async fn remove(&self, id: Uuid) -> PortResult<()> {
        match self.sessions.lock().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PortError::NotFound(format!("upload session {id}"))),
        }
    }

    async fn evict_expired(&self) -> Vec<Arc<UploadSession>> {
        self.evict_expired_at(Utc::now()).await
    }

    async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
