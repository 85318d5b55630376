//! Room directory.
//!
//! Maps a room code to the endpoint of the session hosting it. The hosting
//! session registers on create and unregisters on leave; joining sessions
//! only read.
//!
//! The directory is injected into [`crate::SessionController`] rather than
//! living in a process global, so a networked directory can replace
//! [`MemoryDirectory`] without touching the state machine. Records have no
//! lease: a host that disappears without leaving leaves its record behind.

#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use pairchat_proto::RoomCode;

use crate::EndpointAddress;

/// A registered room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    /// Code the room is shared under.
    pub code: RoomCode,
    /// Endpoint of the hosting session.
    pub endpoint: EndpointAddress,
    /// When the host registered the room.
    pub created_at: DateTime<Utc>,
}

/// Room code to endpoint table.
///
/// Implementations must make `register` and `unregister` atomic with respect
/// to `lookup`. Nothing else is required: there is no compare-and-set, and
/// concurrent hosts that draw the same code overwrite each other.
pub trait RoomDirectory {
    /// Insert or overwrite the record for `record.code`. Last write wins.
    fn register(&mut self, record: RoomRecord);

    /// Record for `code`. `None` if no room is registered under it.
    fn lookup(&self, code: &RoomCode) -> Option<RoomRecord>;

    /// Remove the record for `code`. No-op if absent.
    fn unregister(&mut self, code: &RoomCode);
}

/// Process-local directory.
///
/// Clones share the same table, so every session in a process sees the same
/// rooms. All operations are O(1).
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<Mutex<HashMap<RoomCode, RoomRecord>>>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    /// Returns true if no rooms are registered.
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// A panic while holding the lock cannot leave the map half-written (every
    /// operation is a single map call), so a poisoned lock is still usable.
    fn table(&self) -> MutexGuard<'_, HashMap<RoomCode, RoomRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoomDirectory for MemoryDirectory {
    fn register(&mut self, record: RoomRecord) {
        self.table().insert(record.code.clone(), record);
    }

    fn lookup(&self, code: &RoomCode) -> Option<RoomRecord> {
        self.table().get(code).cloned()
    }

    fn unregister(&mut self, code: &RoomCode) {
        self.table().remove(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, endpoint: &str) -> RoomRecord {
        RoomRecord {
            code: RoomCode::parse(code).unwrap(),
            endpoint: EndpointAddress::new(endpoint),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn register_then_lookup() {
        let mut dir = MemoryDirectory::new();
        dir.register(record("AB12XY", "peer-1"));

        let code = RoomCode::parse("AB12XY").unwrap();
        assert_eq!(dir.lookup(&code).map(|r| r.endpoint), Some(EndpointAddress::new("peer-1")));
    }

    #[test]
    fn last_write_wins() {
        let mut dir = MemoryDirectory::new();
        dir.register(record("AB12XY", "peer-1"));
        dir.register(record("AB12XY", "peer-2"));

        let code = RoomCode::parse("AB12XY").unwrap();
        assert_eq!(dir.lookup(&code).map(|r| r.endpoint), Some(EndpointAddress::new("peer-2")));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut dir = MemoryDirectory::new();
        dir.register(record("AB12XY", "peer-1"));

        let code = RoomCode::parse("AB12XY").unwrap();
        dir.unregister(&code);
        dir.unregister(&code);

        assert_eq!(dir.lookup(&code), None);
        assert!(dir.is_empty());
    }

    #[test]
    fn clones_share_rooms() {
        let mut host_view = MemoryDirectory::new();
        let guest_view = host_view.clone();

        host_view.register(record("ZZ99ZZ", "peer-7"));

        let code = RoomCode::parse("ZZ99ZZ").unwrap();
        assert!(guest_view.lookup(&code).is_some());
    }
}
