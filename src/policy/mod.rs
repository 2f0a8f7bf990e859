mod queue;
mod registry;

pub mod lru;
pub mod priority_fifo;

pub use registry::*;

use alloc::{boxed::Box, vec::Vec};

use tracing::{debug, trace};

use crate::{
    cs::{Entry, EntryRef, TableId},
    signal::Signal,
    timestamp::Timestamp,
};

pub const DEFAULT_POLICY: &str = priority_fifo::PriorityFifoPolicy::POLICY_NAME;

// A replacement policy keeps the content store under its hard limit.
//
// The table and the policy each keep their own index over the same entries:
//  the table by name, the policy in whatever order its algorithm needs.
//  They are kept in agreement through a small notification protocol:
//  - table -> policy: after_insert, after_refresh, before_use, before_erase
//  - policy -> table: before_evict, after which the table erases that entry
// The policy never mutates the table other than by emitting before_evict,
//  and the table only ever erases an entry on its own for management
//  deletions, which it announces with before_erase first.

// The view a policy gets of the table it manages
pub trait PolicyHost {
    fn table_id(&self) -> TableId;

    fn size(&self) -> usize;

    // Time of the operation currently being processed
    fn now(&self) -> Timestamp;

    fn entry(&self, entry: &EntryRef) -> Option<&Entry>;

    // Must panic if the entry is not present
    fn erase_evicted(&mut self, entry: &EntryRef);
}

pub struct EvictionContext<'a> {
    host: &'a mut dyn PolicyHost,
    before_evict: &'a mut Signal<EntryRef>,
    limit: usize,
    evicted: usize,
}

impl<'a> EvictionContext<'a> {
    fn new(
        host: &'a mut dyn PolicyHost,
        before_evict: &'a mut Signal<EntryRef>,
        limit: usize,
    ) -> Self {
        Self {
            host,
            before_evict,
            limit,
            evicted: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.host.size()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_over_limit(&self) -> bool {
        self.host.size() > self.limit
    }

    pub fn now(&self) -> Timestamp {
        self.host.now()
    }

    pub fn entry(&self, entry: &EntryRef) -> Option<&Entry> {
        self.host.entry(entry)
    }

    // Observers see the entry first, then the table erases it.
    //  The caller must already have dropped it from its own index.
    pub fn evict(&mut self, entry: EntryRef) {
        trace!(name = %entry, "evicting");
        self.before_evict.emit(&entry);
        self.host.erase_evicted(&entry);
        self.evicted += 1;
    }

    pub fn evicted_count(&self) -> usize {
        self.evicted
    }
}

// The algorithm part of a policy. Policy wraps it with the limit, the
//  binding and the eviction signal.
pub trait ReplacementPolicy {
    // The new entry may be evicted right away, along with others.
    //  Must leave the table within the limit.
    fn after_insert(&mut self, ctx: &mut EvictionContext<'_>, entry: EntryRef);

    fn after_refresh(&mut self, ctx: &mut EvictionContext<'_>, entry: EntryRef);

    // Management deletion: drop it without emitting an eviction
    fn before_erase(&mut self, entry: &EntryRef);

    fn before_use(&mut self, entry: &EntryRef);

    fn evict_entries(&mut self, ctx: &mut EvictionContext<'_>);

    // In eviction order where the policy has one
    fn tracked_entries(&self) -> Vec<EntryRef>;
}

pub struct Policy {
    name: &'static str,
    limit: usize,
    cs: Option<TableId>,
    before_evict: Signal<EntryRef>,
    inner: Box<dyn ReplacementPolicy>,
}

impl Policy {
    pub fn new(name: &'static str, inner: Box<dyn ReplacementPolicy>) -> Self {
        Self {
            name,
            limit: usize::MAX,
            cs: None,
            before_evict: Signal::new(),
            inner,
        }
    }

    pub fn from_registered<P: RegisteredPolicy>() -> Self {
        Self::new(P::POLICY_NAME, Box::new(P::default()))
    }

    #[cfg(feature = "std")]
    pub fn create(name: &str) -> Result<Self, crate::error::CsError> {
        registry::create_policy(name)
    }

    #[cfg(feature = "std")]
    pub fn policy_names() -> alloc::collections::BTreeSet<&'static str> {
        registry::policy_names()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cs(&self) -> Option<TableId> {
        self.cs
    }

    // Rebinding carries nothing over: the caller re-offers the entries
    pub fn set_cs(&mut self, table: TableId) {
        self.cs = Some(table);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, host: &mut dyn PolicyHost, limit: usize) {
        self.check_host(host);
        debug!(policy = self.name, limit, size = host.size(), "setting limit");
        self.limit = limit;
        if host.size() > limit {
            let mut ctx = EvictionContext::new(&mut *host, &mut self.before_evict, limit);
            self.inner.evict_entries(&mut ctx);
            debug!(
                policy = self.name,
                evicted = ctx.evicted_count(),
                "evicted to honour the new limit"
            );
        }
        debug_assert!(host.size() <= self.limit);
    }

    pub fn before_evict(&mut self) -> &mut Signal<EntryRef> {
        &mut self.before_evict
    }

    // `entry` itself may be evicted before this returns
    pub fn after_insert(&mut self, host: &mut dyn PolicyHost, entry: EntryRef) {
        self.check_host(host);
        let mut ctx = EvictionContext::new(&mut *host, &mut self.before_evict, self.limit);
        self.inner.after_insert(&mut ctx, entry);
        debug_assert!(host.size() <= self.limit);
    }

    pub fn after_refresh(&mut self, host: &mut dyn PolicyHost, entry: EntryRef) {
        self.check_host(host);
        let mut ctx = EvictionContext::new(&mut *host, &mut self.before_evict, self.limit);
        self.inner.after_refresh(&mut ctx, entry);
    }

    pub fn before_erase(&mut self, host: &dyn PolicyHost, entry: &EntryRef) {
        self.check_host(host);
        self.inner.before_erase(entry);
    }

    pub fn before_use(&mut self, host: &dyn PolicyHost, entry: &EntryRef) {
        self.check_host(host);
        self.inner.before_use(entry);
    }

    pub fn tracked_entries(&self) -> Vec<EntryRef> {
        self.inner.tracked_entries()
    }

    fn check_host(&self, host: &dyn PolicyHost) {
        match self.cs {
            Some(table) => assert!(
                table == host.table_id(),
                "policy {} is bound to {:?} but was notified by {:?}",
                self.name,
                table,
                host.table_id()
            ),
            None => panic!("policy {} was notified before being bound to a table", self.name),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use alloc::{collections::BTreeMap, vec::Vec};

    use super::{EvictionContext, Policy, PolicyHost};
    use crate::{
        cs::{Entry, EntryRef, TableId},
        hash::Sha256Digest,
        name::Name,
        packet::Data,
        timestamp::Timestamp,
    };

    pub(crate) struct TestHost {
        pub id: TableId,
        pub entries: BTreeMap<EntryRef, Entry>,
        pub now: Timestamp,
        pub erased: Vec<EntryRef>,
    }

    impl TestHost {
        pub fn new() -> Self {
            Self {
                id: TableId::next(),
                entries: BTreeMap::new(),
                now: Timestamp::from_ms(1000),
                erased: Vec::new(),
            }
        }

        pub fn add(&mut self, uri: &str, freshness: u64, is_unsolicited: bool) -> EntryRef {
            let name: Name = uri.parse().unwrap();
            let data = Data::with_digest(name.clone(), Sha256Digest([0; 32]), uri.as_bytes())
                .with_freshness_period(freshness);
            let entry = EntryRef::new(name);
            self.entries
                .insert(entry.clone(), Entry::new(data, is_unsolicited, self.now));
            entry
        }

        pub fn insert(&mut self, policy: &mut Policy, uri: &str) -> EntryRef {
            let entry = self.add(uri, 0, false);
            policy.after_insert(self, entry.clone());
            entry
        }

        pub fn names(&self) -> Vec<&str> {
            self.entries
                .values()
                .map(|e| core::str::from_utf8(e.payload()).unwrap())
                .collect()
        }

        pub fn erased_names(&self) -> Vec<alloc::string::String> {
            self.erased.iter().map(|e| alloc::format!("{}", e)).collect()
        }
    }

    impl PolicyHost for TestHost {
        fn table_id(&self) -> TableId {
            self.id
        }

        fn size(&self) -> usize {
            self.entries.len()
        }

        fn now(&self) -> Timestamp {
            self.now
        }

        fn entry(&self, entry: &EntryRef) -> Option<&Entry> {
            self.entries.get(entry)
        }

        fn erase_evicted(&mut self, entry: &EntryRef) {
            assert!(self.entries.remove(entry).is_some());
            self.erased.push(entry.clone());
        }
    }

    pub(crate) fn assert_consistent(host: &TestHost, policy: &Policy) {
        let mut tracked = policy.tracked_entries();
        tracked.sort();
        let stored: Vec<EntryRef> = host.entries.keys().cloned().collect();
        assert_eq!(tracked, stored);
    }

    struct NeverEvicts;

    impl super::ReplacementPolicy for NeverEvicts {
        fn after_insert(&mut self, _: &mut EvictionContext<'_>, _: EntryRef) {}
        fn after_refresh(&mut self, _: &mut EvictionContext<'_>, _: EntryRef) {}
        fn before_erase(&mut self, _: &EntryRef) {}
        fn before_use(&mut self, _: &EntryRef) {}
        fn evict_entries(&mut self, _: &mut EvictionContext<'_>) {}
        fn tracked_entries(&self) -> Vec<EntryRef> {
            Vec::new()
        }
    }

    #[test]
    #[should_panic(expected = "before being bound")]
    fn test_unbound_policy_panics() {
        let mut host = TestHost::new();
        let mut policy = Policy::new("never", alloc::boxed::Box::new(NeverEvicts));
        host.insert(&mut policy, "/a");
    }

    #[test]
    #[should_panic(expected = "is bound to")]
    fn test_foreign_host_panics() {
        let mut host = TestHost::new();
        let mut policy = Policy::new("never", alloc::boxed::Box::new(NeverEvicts));
        policy.set_cs(TableId::next());
        let entry = host.add("/a", 0, false);
        policy.before_use(&host, &entry);
    }

    #[test]
    fn test_defaults() {
        let policy = Policy::new("never", alloc::boxed::Box::new(NeverEvicts));
        assert_eq!(policy.name(), "never");
        assert_eq!(policy.limit(), usize::MAX);
        assert_eq!(policy.cs(), None);
    }
}
