// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of live SMPP sessions.
//!
//! All mutations and snapshot reads go through one lock, so a reader sees
//! either the set before a mutation or the set after it. Callers only ever
//! receive owned [`Session`] copies.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use smsrcs_core::{BridgeError, SessionHandle};
use tracing::debug;

use crate::session::{BindMode, Session, SessionLink, SessionState};

/// Arena of sessions keyed by [`SessionHandle`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_handle: AtomicU64,
    sessions: RwLock<HashMap<SessionHandle, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a handle for a new connection. Handles are never reused.
    pub fn next_handle(&self) -> SessionHandle {
        SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Adds a session in state `connected`.
    ///
    /// Registering the same handle twice is an error.
    pub fn register(
        &self,
        handle: SessionHandle,
        link: Arc<SessionLink>,
        peer_addr: Option<SocketAddr>,
    ) -> Result<Session, BridgeError> {
        let mut sessions = self.write()?;
        if sessions.contains_key(&handle) {
            return Err(BridgeError::SessionAlreadyRegistered(handle));
        }
        let session = Session {
            handle,
            state: SessionState::Connected,
            system_id: None,
            peer_addr,
            connected_at: Utc::now(),
            bound_at: None,
            link,
        };
        sessions.insert(handle, session.clone());
        debug!(session = %handle, ?peer_addr, "session registered");
        Ok(session)
    }

    /// Transitions `connected -> bound`.
    pub fn mark_bound(
        &self,
        handle: SessionHandle,
        system_id: &str,
        mode: BindMode,
    ) -> Result<Session, BridgeError> {
        let mut sessions = self.write()?;
        let session = sessions
            .get_mut(&handle)
            .ok_or(BridgeError::UnknownSession(handle))?;
        if session.state != SessionState::Connected {
            return Err(BridgeError::InvalidSessionState {
                handle,
                state: session.state.to_string(),
            });
        }
        session.state = SessionState::Bound(mode);
        session.system_id = Some(system_id.to_string());
        session.bound_at = Some(Utc::now());
        debug!(session = %handle, system_id, %mode, "session bound");
        Ok(session.clone())
    }

    /// Removes the session and returns its final record in state `closed`.
    ///
    /// Unknown handles return `None`, so repeated calls are harmless.
    pub fn unregister(&self, handle: SessionHandle) -> Option<Session> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut session = sessions.remove(&handle)?;
        session.state = SessionState::Closed;
        debug!(session = %handle, "session unregistered");
        Some(session)
    }

    /// Copy of one session, if present.
    pub fn get(&self, handle: SessionHandle) -> Option<Session> {
        self.read().get(&handle).cloned()
    }

    /// Point-in-time copy of every bound session, ordered by handle.
    pub fn all_bound(&self) -> std::vec::IntoIter<Session> {
        let mut bound: Vec<Session> = self
            .read()
            .values()
            .filter(|s| matches!(s.state, SessionState::Bound(_)))
            .cloned()
            .collect();
        bound.sort_by_key(|s| s.handle.0);
        bound.into_iter()
    }

    /// Sessions that may serve `address`.
    ///
    /// Sessions carry no per-subscriber numbering, so every bound session is a
    /// candidate and this is the same set as [`all_bound`](Self::all_bound).
    pub fn find_by_address(&self, address: &str) -> std::vec::IntoIter<Session> {
        let candidates = self.all_bound();
        debug!(
            address,
            candidates = candidates.len(),
            "address lookup falls back to every bound session"
        );
        candidates
    }

    /// Number of registered sessions in any state.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn bound_count(&self) -> usize {
        self.read()
            .values()
            .filter(|s| matches!(s.state, SessionState::Bound(_)))
            .count()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionHandle, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SessionHandle, Session>>, BridgeError> {
        self.sessions
            .write()
            .map_err(|e| BridgeError::Internal(format!("session registry lock poisoned: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> Arc<SessionLink> {
        let (link, _rx) = SessionLink::new(1);
        Arc::new(link)
    }

    fn bound_registry(n: usize) -> (SessionRegistry, Vec<SessionHandle>) {
        let registry = SessionRegistry::new();
        let handles = (0..n)
            .map(|i| {
                let handle = registry.next_handle();
                registry.register(handle, link(), None).unwrap();
                registry
                    .mark_bound(handle, &format!("esme{i}"), BindMode::Transceiver)
                    .unwrap();
                handle
            })
            .collect();
        (registry, handles)
    }

    #[test]
    fn handles_are_unique_and_increasing() {
        let registry = SessionRegistry::new();
        let a = registry.next_handle();
        let b = registry.next_handle();
        assert!(b.0 > a.0);
    }

    #[test]
    fn double_register_is_reported() {
        let registry = SessionRegistry::new();
        let handle = registry.next_handle();
        registry.register(handle, link(), None).unwrap();
        let err = registry.register(handle, link(), None).unwrap_err();
        assert!(matches!(err, BridgeError::SessionAlreadyRegistered(h) if h == handle));
    }

    #[test]
    fn register_starts_connected_and_not_bound() {
        let registry = SessionRegistry::new();
        let handle = registry.next_handle();
        let session = registry.register(handle, link(), None).unwrap();
        assert_eq!(session.state, SessionState::Connected);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all_bound().count(), 0);
    }

    #[test]
    fn mark_bound_unknown_handle_fails() {
        let registry = SessionRegistry::new();
        let err = registry
            .mark_bound(SessionHandle(99), "x", BindMode::Transceiver)
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownSession(SessionHandle(99))));
    }

    #[test]
    fn mark_bound_twice_fails() {
        let (registry, handles) = bound_registry(1);
        let err = registry
            .mark_bound(handles[0], "again", BindMode::Transceiver)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidSessionState { .. }));
        assert_eq!(
            registry.get(handles[0]).unwrap().system_id.as_deref(),
            Some("esme0")
        );
    }

    #[test]
    fn unregister_is_idempotent() {
        let (registry, handles) = bound_registry(1);
        let closed = registry.unregister(handles[0]).unwrap();
        assert_eq!(closed.state, SessionState::Closed);
        assert!(registry.unregister(handles[0]).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_unregister() {
        let (registry, handles) = bound_registry(3);
        let snapshot = registry.all_bound();
        registry.unregister(handles[1]);

        let seen: Vec<_> = snapshot.map(|s| s.handle).collect();
        assert_eq!(seen, handles);
        assert_eq!(registry.bound_count(), 2);
    }

    #[test]
    fn find_by_address_matches_all_bound() {
        let (registry, _) = bound_registry(2);
        let by_address: Vec<_> = registry.find_by_address("447700900123").map(|s| s.handle).collect();
        let all: Vec<_> = registry.all_bound().map(|s| s.handle).collect();
        assert_eq!(by_address, all);
    }

    #[test]
    fn concurrent_register_and_unregister_keep_counts_consistent() {
        let registry = Arc::new(SessionRegistry::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let handle = registry.next_handle();
                        registry.register(handle, link(), None).unwrap();
                        registry
                            .mark_bound(handle, "esme", BindMode::Receiver)
                            .unwrap();
                        for session in registry.all_bound() {
                            assert!(matches!(session.state, SessionState::Bound(_)));
                        }
                        registry.unregister(handle);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
