use alloc::{collections::BTreeMap, vec::Vec};

use super::{queue::CleanupQueue, EvictionContext, RegisteredPolicy, ReplacementPolicy};
use crate::{cs::EntryRef, timestamp::Timestamp};

// Priority FIFO: evicts unsolicited Data first, then stale Data, then
//  fresh Data, each group in order of arrival.
// An entry's group is decided when it is inserted or refreshed. Fresh
//  entries whose freshness runs out are moved to the stale group lazily,
//  right before an eviction decision is made. The fresh group is also
//  indexed by deadline, so aging only visits entries that have expired.
#[derive(Default)]
pub struct PriorityFifoPolicy {
    unsolicited: CleanupQueue,
    stale: CleanupQueue,
    fresh: CleanupQueue,
    // (deadline, sequence in `fresh`) for every fresh entry, and back
    fresh_by_deadline: BTreeMap<(Timestamp, u64), EntryRef>,
    fresh_deadlines: BTreeMap<EntryRef, (Timestamp, u64)>,
}

impl RegisteredPolicy for PriorityFifoPolicy {
    const POLICY_NAME: &'static str = "priority_fifo";
}

impl PriorityFifoPolicy {
    fn attach(&mut self, ctx: &EvictionContext<'_>, entry: EntryRef) {
        match ctx.entry(&entry) {
            Some(e) if e.is_unsolicited() => {
                self.unsolicited.push_back(entry);
            }
            Some(e) if e.is_stale(ctx.now()) => {
                self.stale.push_back(entry);
            }
            Some(e) => {
                let deadline = e.freshness_deadline();
                let sequence = self.fresh.push_back(entry.clone());
                self.fresh_by_deadline
                    .insert((deadline, sequence), entry.clone());
                self.fresh_deadlines.insert(entry, (deadline, sequence));
            }
            None => panic!("policy notified about {} which is not in the table", entry),
        }
    }

    fn detach(&mut self, entry: &EntryRef) -> bool {
        self.unsolicited.remove(entry) || self.stale.remove(entry) || self.detach_fresh(entry)
    }

    fn detach_fresh(&mut self, entry: &EntryRef) -> bool {
        match self.fresh_deadlines.remove(entry) {
            Some(key) => {
                self.fresh_by_deadline.remove(&key);
                self.fresh.remove(entry)
            }
            None => false,
        }
    }

    // Moves every fresh entry whose deadline has passed to the stale group.
    //  Entries expiring together keep their arrival order.
    fn age_fresh_entries(&mut self, now: Timestamp) {
        let expired: Vec<(Timestamp, u64)> = self
            .fresh_by_deadline
            .range(..=(now, u64::MAX))
            .map(|(key, _)| *key)
            .collect();
        if expired.is_empty() {
            return;
        }

        let mut batch: Vec<(u64, EntryRef)> = Vec::with_capacity(expired.len());
        for key in expired {
            if let Some(entry) = self.fresh_by_deadline.remove(&key) {
                self.fresh_deadlines.remove(&entry);
                self.fresh.remove(&entry);
                batch.push((key.1, entry));
            }
        }
        batch.sort_unstable_by_key(|(sequence, _)| *sequence);
        for (_, entry) in batch {
            self.stale.push_back(entry);
        }
    }

    fn pop_victim(&mut self) -> Option<EntryRef> {
        if let Some(victim) = self.unsolicited.pop_front() {
            return Some(victim);
        }
        if let Some(victim) = self.stale.pop_front() {
            return Some(victim);
        }
        let victim = self.fresh.pop_front()?;
        if let Some(key) = self.fresh_deadlines.remove(&victim) {
            self.fresh_by_deadline.remove(&key);
        }
        Some(victim)
    }
}

impl ReplacementPolicy for PriorityFifoPolicy {
    fn after_insert(&mut self, ctx: &mut EvictionContext<'_>, entry: EntryRef) {
        self.attach(ctx, entry);
        self.evict_entries(ctx);
    }

    fn after_refresh(&mut self, ctx: &mut EvictionContext<'_>, entry: EntryRef) {
        let detached = self.detach(&entry);
        debug_assert!(detached, "refreshed entry {} is not tracked", entry);
        self.attach(ctx, entry);
    }

    fn before_erase(&mut self, entry: &EntryRef) {
        let detached = self.detach(entry);
        debug_assert!(detached, "erased entry {} is not tracked", entry);
    }

    // Use is observed only: it does not change an entry's place
    fn before_use(&mut self, entry: &EntryRef) {
        debug_assert!(
            self.unsolicited.contains(entry)
                || self.stale.contains(entry)
                || self.fresh.contains(entry),
            "used entry {} is not tracked",
            entry
        );
    }

    fn evict_entries(&mut self, ctx: &mut EvictionContext<'_>) {
        if !ctx.is_over_limit() {
            return;
        }
        if self.unsolicited.len() < ctx.size() - ctx.limit() {
            self.age_fresh_entries(ctx.now());
        }
        while ctx.is_over_limit() {
            match self.pop_victim() {
                Some(victim) => ctx.evict(victim),
                None => {
                    debug_assert!(false, "table holds entries the policy does not know about");
                    break;
                }
            }
        }
    }

    fn tracked_entries(&self) -> Vec<EntryRef> {
        self.unsolicited
            .iter()
            .chain(self.stale.iter())
            .chain(self.fresh.iter())
            .cloned()
            .collect()
    }
}
