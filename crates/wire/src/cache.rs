//! The record store port.
//!
//! The wire layer never owns the cache; it reads and populates one
//! through [`RecordStore`]. Handles are opaque tickets whose meaning
//! belongs entirely to the implementation, and CNAME links are weak:
//! a link carries the unique id the target had when the link was made,
//! and resolution fails once the target slot has been reused.

use hearth_dns_domain::RecordFlags;
use std::net::IpAddr;

/// Opaque reference to a cached record. Valid until the store evicts
/// or reuses the slot; [`RecordStore::cname_target`] revalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle(pub u64);

/// Storage and lookup for cached records.
///
/// Lookups take `now` so the store can skip expired entries, and a
/// `mask` of flags the caller cares about. The `after` parameter turns
/// `find_by_name`/`find_by_addr` into resumable scans over all records
/// sharing a key.
pub trait RecordStore {
    /// Starts a batch of inserts from one upstream reply.
    fn begin_insert(&mut self);

    /// Makes the records inserted since [`begin_insert`](Self::begin_insert)
    /// visible.
    fn commit_insert(&mut self);

    /// Discards the records inserted since [`begin_insert`](Self::begin_insert).
    /// Called when a reply turns out to be malformed partway through, so
    /// no half-parsed reply ever populates the cache.
    fn abort_insert(&mut self);

    /// Inserts one record. `addr` is `None` for CNAMEs and negative
    /// entries. Returns `None` when the store refuses the record.
    fn insert(
        &mut self,
        name: &str,
        addr: Option<IpAddr>,
        now: u64,
        ttl: u32,
        flags: RecordFlags,
    ) -> Option<RecordHandle>;

    /// Finds the next live record for `name` whose flags intersect
    /// `mask`, scanning forward from `after`.
    fn find_by_name(
        &self,
        after: Option<RecordHandle>,
        name: &str,
        now: u64,
        mask: RecordFlags,
    ) -> Option<RecordHandle>;

    /// Finds the next live record holding `addr`, scanning forward from
    /// `after`.
    fn find_by_addr(
        &self,
        after: Option<RecordHandle>,
        addr: IpAddr,
        now: u64,
        mask: RecordFlags,
    ) -> Option<RecordHandle>;

    fn name_of(&self, handle: RecordHandle) -> &str;

    fn flags_of(&self, handle: RecordHandle) -> RecordFlags;

    /// Absolute expiry time. Meaningless for IMMORTAL records.
    fn time_to_die(&self, handle: RecordHandle) -> u64;

    /// Slot-reuse generation counter, for weak CNAME links.
    fn uid_of(&self, handle: RecordHandle) -> u64;

    /// The record's address, if it carries one.
    fn address_of(&self, handle: RecordHandle) -> Option<IpAddr>;

    /// Points the CNAME record at `handle` to `target`, remembering
    /// `uid` for later revalidation.
    fn set_cname_target(&mut self, handle: RecordHandle, target: RecordHandle, uid: u64);

    /// Follows a CNAME link, returning `None` when the record has no
    /// link or the target slot has been reused since the link was made.
    fn cname_target(&self, handle: RecordHandle) -> Option<RecordHandle>;
}

/// Scope guard for a cache insert batch. Dropping the session without
/// calling [`commit`](InsertSession::commit) aborts the batch, so an
/// early `?` return on a malformed reply cleans up by itself.
pub struct InsertSession<'a> {
    store: &'a mut dyn RecordStore,
    committed: bool,
}

impl<'a> InsertSession<'a> {
    pub fn begin(store: &'a mut dyn RecordStore) -> Self {
        store.begin_insert();
        InsertSession {
            store,
            committed: false,
        }
    }

    pub fn insert(
        &mut self,
        name: &str,
        addr: Option<IpAddr>,
        now: u64,
        ttl: u32,
        flags: RecordFlags,
    ) -> Option<RecordHandle> {
        self.store.insert(name, addr, now, ttl, flags)
    }

    /// Weakly links the CNAME at `from` to `to`.
    pub fn link_cname(&mut self, from: RecordHandle, to: RecordHandle) {
        let uid = self.store.uid_of(to);
        self.store.set_cname_target(from, to, uid);
    }

    pub fn commit(mut self) {
        self.store.commit_insert();
        self.committed = true;
    }
}

impl Drop for InsertSession<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.store.abort_insert();
        }
    }
}
