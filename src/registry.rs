//! User registry
//!
//! Tracks every live session in connection order and indexes named
//! sessions by display name. Owned by the `ChatServer` actor, which makes
//! every mutation atomic with respect to the others.

use std::collections::HashMap;

use crate::error::AppError;
use crate::session::{ConnectionHandle, Session};
use crate::types::SessionId;

/// Result of a successful `bind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// First name for this session; a join announcement is due
    Joined,
    /// Session was already named and now carries the new name
    Renamed { previous: String },
}

/// Registry of connected sessions
///
/// Duplicate names are accepted. Lookups by name resolve to the earliest
/// connected session holding that name.
#[derive(Debug)]
pub struct UserRegistry {
    /// All sessions: SessionId -> Session
    sessions: HashMap<SessionId, Session>,
    /// Session IDs in connection order
    order: Vec<SessionId>,
    /// Name index: name -> holders, ordered by connection sequence
    names: HashMap<String, Vec<SessionId>>,
    next_seq: u64,
    /// Optional cap on name length, in characters
    max_name_len: Option<usize>,
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UserRegistry {
    pub fn new(max_name_len: Option<usize>) -> Self {
        Self {
            sessions: HashMap::new(),
            order: Vec::new(),
            names: HashMap::new(),
            next_seq: 0,
            max_name_len,
        }
    }

    /// Create an unnamed session for a newly accepted connection
    pub fn register(&mut self, handle: ConnectionHandle) -> SessionId {
        let id = SessionId::new();
        let seq = self.next_seq;
        self.next_seq += 1;

        self.sessions.insert(id, Session::new(id, seq, handle));
        self.order.push(id);
        id
    }

    /// Bind a display name to a session
    ///
    /// Fails with `InvalidName` for an empty name, or one over the configured
    /// length cap, leaving the session untouched.
    pub fn bind(&mut self, id: SessionId, name: String) -> Result<BindOutcome, AppError> {
        self.validate_name(&name)?;

        let session = self.sessions.get_mut(&id).ok_or(AppError::UnknownSession)?;
        let seq = session.seq;
        let previous = session.name.replace(name.clone());

        match previous {
            None => {
                self.index_name(id, seq, name);
                Ok(BindOutcome::Joined)
            }
            Some(previous) => {
                if previous != name {
                    self.unindex_name(id, &previous);
                    self.index_name(id, seq, name);
                }
                Ok(BindOutcome::Renamed { previous })
            }
        }
    }

    /// Resolve a name to the earliest connected session holding it
    pub fn find_by_name(&self, name: &str) -> Option<&Session> {
        self.names
            .get(name)
            .and_then(|ids| ids.first())
            .and_then(|id| self.sessions.get(id))
    }

    /// Snapshot of all sessions, named and unnamed, in connection order
    pub fn all_sessions(&self) -> Vec<Session> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .cloned()
            .collect()
    }

    /// Remove a session and its name index entry
    ///
    /// Returns `None` if the session was already gone, so repeated
    /// disconnect notifications are harmless.
    pub fn unregister(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        self.order.retain(|other| *other != id);
        if let Some(name) = &session.name {
            self.unindex_name(id, name);
        }
        Some(session)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions that have bound a name
    pub fn named_count(&self) -> usize {
        self.names.values().map(Vec::len).sum()
    }

    fn validate_name(&self, name: &str) -> Result<(), AppError> {
        if name.is_empty() {
            return Err(AppError::InvalidName("name must not be empty".to_string()));
        }
        match self.max_name_len {
            Some(max) if name.chars().count() > max => Err(AppError::InvalidName(format!(
                "name longer than {} characters",
                max
            ))),
            _ => Ok(()),
        }
    }

    fn index_name(&mut self, id: SessionId, seq: u64, name: String) {
        let sessions = &self.sessions;
        let holders = self.names.entry(name).or_default();
        let pos = holders.partition_point(|other| {
            sessions.get(other).map_or(false, |s| s.seq < seq)
        });
        holders.insert(pos, id);
    }

    fn unindex_name(&mut self, id: SessionId, name: &str) {
        if let Some(holders) = self.names.get_mut(name) {
            holders.retain(|other| *other != id);
            if holders.is_empty() {
                self.names.remove(name);
            }
        }
    }
}
