//! Per-conversation query accumulation.
//!
//! Each session id owns one accumulating [`QueryIr`] behind its own mutex, so
//! concurrent requests on the same session serialize their read-modify-write
//! and no merge is ever lost or half-visible.

use crate::ir::QueryIr;
use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

pub struct SessionStore {
    sessions: RwLock<AHashMap<String, Arc<Mutex<QueryIr>>>>,
    default_limit: usize,
}

impl SessionStore {
    #[must_use]
    pub fn new(default_limit: usize) -> Self {
        Self {
            sessions: RwLock::new(AHashMap::new()),
            default_limit,
        }
    }

    #[inline]
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    fn handle(&self, session_id: &str, default_limit: usize) -> Arc<Mutex<QueryIr>> {
        if let Some(ctx) = self.sessions.read().get(session_id) {
            return ctx.clone();
        }
        let mut sessions = self.sessions.write();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(QueryIr::new(default_limit))))
            .clone()
    }

    /// Folds a translated fragment into the session's accumulated IR and
    /// returns the result. The merge happens under the session mutex, so it
    /// is all-or-nothing per request.
    ///
    /// `default_limit` is the caller's configured default (the collection's,
    /// for query requests): a new session starts there, and a fragment
    /// carrying exactly that value never overwrites an accumulated limit.
    pub fn merge(&self, session_id: &str, fragment: QueryIr, default_limit: usize) -> QueryIr {
        let ctx = self.handle(session_id, default_limit);
        let mut ir = ctx.lock();
        ir.merge(fragment, default_limit);
        ir.clone()
    }

    /// Current accumulated IR; empty for an unknown session.
    pub fn get(&self, session_id: &str) -> QueryIr {
        match self.sessions.read().get(session_id) {
            Some(ctx) => ctx.lock().clone(),
            None => QueryIr::new(self.default_limit),
        }
    }

    /// Drops the session entirely; the next merge recreates it from the
    /// caller's default.
    pub fn reset(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    /// Snapshot of every session, for persistence.
    pub fn export(&self) -> AHashMap<String, QueryIr> {
        self.sessions
            .read()
            .iter()
            .map(|(id, ctx)| (id.clone(), ctx.lock().clone()))
            .collect()
    }

    /// Restores persisted sessions, replacing any current state.
    pub fn restore(&self, contexts: AHashMap<String, QueryIr>) {
        let mut sessions = self.sessions.write();
        sessions.clear();
        for (id, ir) in contexts {
            sessions.insert(id, Arc::new(Mutex::new(ir)));
        }
    }
}
