use alloc::vec::Vec;

use super::{queue::CleanupQueue, EvictionContext, RegisteredPolicy, ReplacementPolicy};
use crate::cs::EntryRef;

// Evicts the entry that has gone longest without being inserted,
//  refreshed or used to satisfy a lookup
#[derive(Default)]
pub struct LruPolicy {
    queue: CleanupQueue,
}

impl RegisteredPolicy for LruPolicy {
    const POLICY_NAME: &'static str = "lru";
}

impl ReplacementPolicy for LruPolicy {
    fn after_insert(&mut self, ctx: &mut EvictionContext<'_>, entry: EntryRef) {
        self.queue.push_back(entry);
        self.evict_entries(ctx);
    }

    fn after_refresh(&mut self, _ctx: &mut EvictionContext<'_>, entry: EntryRef) {
        let moved = self.queue.move_to_back(&entry);
        debug_assert!(moved, "refreshed entry {} is not tracked", entry);
    }

    fn before_erase(&mut self, entry: &EntryRef) {
        let removed = self.queue.remove(entry);
        debug_assert!(removed, "erased entry {} is not tracked", entry);
    }

    fn before_use(&mut self, entry: &EntryRef) {
        let moved = self.queue.move_to_back(entry);
        debug_assert!(moved, "used entry {} is not tracked", entry);
    }

    fn evict_entries(&mut self, ctx: &mut EvictionContext<'_>) {
        while ctx.is_over_limit() {
            match self.queue.pop_front() {
                Some(victim) => ctx.evict(victim),
                None => {
                    debug_assert!(false, "table holds entries the policy does not know about");
                    break;
                }
            }
        }
    }

    fn tracked_entries(&self) -> Vec<EntryRef> {
        self.queue.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::LruPolicy;
    use crate::policy::{
        tests::{assert_consistent, TestHost},
        Policy,
    };

    fn lru(host: &mut TestHost, limit: usize) -> Policy {
        let mut policy = Policy::from_registered::<LruPolicy>();
        policy.set_cs(host.id);
        policy.set_limit(host, limit);
        policy
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut host = TestHost::new();
        let mut policy = lru(&mut host, 2);
        assert_eq!(policy.name(), "lru");

        let a = host.insert(&mut policy, "/a");
        host.insert(&mut policy, "/b");
        policy.before_use(&host, &a);
        host.insert(&mut policy, "/c");

        assert_eq!(host.erased_names(), ["/b"]);
        assert_eq!(host.names(), ["/a", "/c"]);
        assert_consistent(&host, &policy);
    }

    #[test]
    fn test_refresh_counts_as_use() {
        let mut host = TestHost::new();
        let mut policy = lru(&mut host, 2);

        let a = host.insert(&mut policy, "/a");
        host.insert(&mut policy, "/b");
        policy.after_refresh(&mut host, a);
        assert!(host.erased.is_empty());

        host.insert(&mut policy, "/c");
        assert_eq!(host.erased_names(), ["/b"]);
        assert_consistent(&host, &policy);
    }

    #[test]
    fn test_erase_is_not_an_eviction() {
        let mut host = TestHost::new();
        let mut policy = lru(&mut host, 2);

        let a = host.insert(&mut policy, "/a");
        host.insert(&mut policy, "/b");
        policy.before_erase(&host, &a);
        host.entries.remove(&a);

        host.insert(&mut policy, "/c");
        assert!(host.erased.is_empty());
        host.insert(&mut policy, "/d");
        assert_eq!(host.erased_names(), ["/b"]);
        assert_consistent(&host, &policy);
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let mut host = TestHost::new();
        let mut policy = lru(&mut host, 0);

        host.insert(&mut policy, "/a");
        assert_eq!(host.erased_names(), ["/a"]);
        assert!(host.entries.is_empty());
        assert!(policy.tracked_entries().is_empty());
    }

    #[test]
    fn test_shrinking_limit() {
        let mut host = TestHost::new();
        let mut policy = lru(&mut host, 5);
        for uri in ["/a", "/b", "/c", "/d", "/e"] {
            host.insert(&mut policy, uri);
        }

        policy.set_limit(&mut host, 2);
        assert_eq!(host.erased_names(), ["/a", "/b", "/c"]);
        assert_eq!(host.entries.len(), 2);

        // Nothing to do when already within the limit
        policy.set_limit(&mut host, 3);
        assert_eq!(host.erased.len(), 3);
        assert_consistent(&host, &policy);
    }
}
