mod entry;
mod table;

pub use entry::*;
pub use table::*;

use alloc::{rc::Rc, vec::Vec};
use core::cell::Cell;

use tracing::{debug, trace, warn};

use crate::{
    config::CsConfig,
    error::CsError,
    name::Name,
    packet::{Data, Interest},
    policy::{priority_fifo::PriorityFifoPolicy, Policy, PolicyRegistry},
    signal::{Connection, Signal},
    store::ContentStore,
    timestamp::Timestamp,
};

// The content store wires a table to a replacement policy:
// 1. A Data with a new name is stored, then the policy hears after_insert and
//      may evict (possibly the new entry itself) to stay within the limit.
// 2. A Data with a known name refreshes the entry, and the policy hears
//      after_refresh.
// 3. A lookup hit is announced with before_use before the payload is returned.
// 4. Management deletions are announced with before_erase, then performed.
// 5. Whatever the policy evicts is erased by the table as part of the
//      policy's before_evict emission; there is no other eviction path.
// Policy notifications are never nested: each is issued by the store only
//  after the previous one has returned.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CsCounters {
    pub n_hits: u64,
    pub n_misses: u64,
    // New entries only, refreshes are not counted
    pub n_inserts: u64,
    pub n_evictions: u64,
}

pub struct Cs {
    table: Table,
    policy: Policy,
    should_admit: bool,
    should_serve: bool,
    n_hits: u64,
    n_misses: u64,
    n_inserts: u64,
    // Shared with the observer connected to the policy's before_evict
    n_evictions: Rc<Cell<u64>>,
    eviction_counter: Connection,
}

impl Cs {
    // Uses the default (priority FIFO) policy
    pub fn new(limit: usize) -> Self {
        Self::with_policy(Policy::from_registered::<PriorityFifoPolicy>(), limit)
    }

    pub fn with_policy(mut policy: Policy, limit: usize) -> Self {
        let table = Table::new();
        let n_evictions = Rc::new(Cell::new(0));
        let eviction_counter = Self::bind_policy(&mut policy, &table, &n_evictions);
        let mut cs = Self {
            table,
            policy,
            should_admit: true,
            should_serve: true,
            n_hits: 0,
            n_misses: 0,
            n_inserts: 0,
            n_evictions,
            eviction_counter,
        };
        cs.policy.set_limit(&mut cs.table, limit);
        cs
    }

    // An unknown policy name is reported, not replaced
    pub fn from_config_in(config: &CsConfig, registry: &PolicyRegistry) -> Result<Self, CsError> {
        let policy = registry.create(&config.policy)?;
        Ok(Self::configured(policy, config))
    }

    #[cfg(feature = "std")]
    pub fn from_config(config: &CsConfig) -> Result<Self, CsError> {
        let policy = Policy::create(&config.policy)?;
        Ok(Self::configured(policy, config))
    }

    fn configured(policy: Policy, config: &CsConfig) -> Self {
        if config.limit == 0 {
            warn!("content store limit is zero, nothing will be cached");
        }
        let mut cs = Self::with_policy(policy, config.limit);
        cs.enable_admit(config.admit);
        cs.enable_serve(config.serve);
        cs
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    // Replaces the policy. The previous policy's index is discarded and every
    //  entry is offered to the new one as if it had just been inserted, after
    //  which the current limit is applied. Observers connected through
    //  before_evict follow the store onto the new policy.
    pub fn set_policy(&mut self, policy: Policy) {
        let limit = self.policy.limit();
        debug!(
            from = self.policy.name(),
            to = policy.name(),
            size = self.table.len(),
            "replacing policy"
        );
        let mut previous = core::mem::replace(&mut self.policy, policy);
        previous.before_evict().disconnect(self.eviction_counter);
        self.eviction_counter =
            Self::bind_policy(&mut self.policy, &self.table, &self.n_evictions);
        self.policy
            .before_evict()
            .take_observers(previous.before_evict());

        let entries: Vec<EntryRef> = self.table.iter().map(|(e, _)| e.clone()).collect();
        for entry in entries {
            // A policy may evict others while being rebuilt
            if self.table.contains(&entry) {
                self.policy.after_insert(&mut self.table, entry);
            }
        }
        self.policy.set_limit(&mut self.table, limit);
    }

    // On error the current policy stays in place
    #[cfg(feature = "std")]
    pub fn set_policy_by_name(&mut self, name: &str) -> Result<(), CsError> {
        let policy = Policy::create(name)?;
        self.set_policy(policy);
        Ok(())
    }

    fn bind_policy(policy: &mut Policy, table: &Table, n_evictions: &Rc<Cell<u64>>) -> Connection {
        policy.set_cs(table.id());
        let n_evictions = n_evictions.clone();
        policy
            .before_evict()
            .connect(move |_| n_evictions.set(n_evictions.get() + 1))
    }

    // Observers of evictions, kept across policy swaps
    pub fn before_evict(&mut self) -> &mut Signal<EntryRef> {
        self.policy.before_evict()
    }

    pub fn should_admit(&self) -> bool {
        self.should_admit
    }

    pub fn enable_admit(&mut self, should_admit: bool) {
        if self.should_admit != should_admit {
            debug!(should_admit, "changing admission");
        }
        self.should_admit = should_admit;
    }

    pub fn should_serve(&self) -> bool {
        self.should_serve
    }

    pub fn enable_serve(&mut self, should_serve: bool) {
        if self.should_serve != should_serve {
            debug!(should_serve, "changing serving");
        }
        self.should_serve = should_serve;
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, name: &Name) -> Option<&Entry> {
        self.table.get(name).map(|(_, e)| e)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.table.iter().map(|(_, e)| e)
    }

    // Not a use as far as the policy is concerned
    pub fn find_longest_prefix(&self, name: &Name) -> Option<&Entry> {
        let entry = self.table.find_longest_prefix(name)?;
        self.get(entry.name())
    }

    pub fn counters(&self) -> CsCounters {
        CsCounters {
            n_hits: self.n_hits,
            n_misses: self.n_misses,
            n_inserts: self.n_inserts,
            n_evictions: self.n_evictions.get(),
        }
    }
}

impl ContentStore for Cs {
    fn insert(&mut self, data: Data, is_unsolicited: bool, now: Timestamp) -> bool {
        if !self.should_admit {
            trace!(name = %data.name, "admission disabled, dropping");
            return false;
        }
        self.table.set_now(now);
        let (entry, is_new) = self.table.insert(data, is_unsolicited, now);
        if is_new {
            self.n_inserts += 1;
            self.policy.after_insert(&mut self.table, entry.clone());
        } else {
            self.policy.after_refresh(&mut self.table, entry.clone());
        }
        self.table.contains(&entry)
    }

    fn find(&mut self, interest: &Interest, now: Timestamp) -> Option<&[u8]> {
        if !self.should_serve {
            return None;
        }
        self.table.set_now(now);
        let entry = match self.table.find(interest, now) {
            Some(entry) => entry,
            None => {
                self.n_misses += 1;
                trace!(name = %interest.name, "miss");
                return None;
            }
        };
        self.n_hits += 1;
        trace!(name = %interest.name, entry = %entry, "hit");
        self.policy.before_use(&self.table, &entry);
        self.table.get(entry.name()).map(|(_, e)| e.payload())
    }

    fn erase(&mut self, prefix: &Name, limit: usize) -> usize {
        let erased: Vec<EntryRef> = self
            .table
            .entries_under(prefix)
            .take(limit)
            .map(|(e, _)| e.clone())
            .collect();
        for entry in erased.iter() {
            self.policy.before_erase(&self.table, entry);
            self.table.erase(entry);
        }
        debug!(prefix = %prefix, n_erased = erased.len(), "erased");
        erased.len()
    }

    fn size(&self) -> usize {
        self.table.len()
    }

    fn limit(&self) -> usize {
        self.policy.limit()
    }

    fn set_limit(&mut self, limit: usize) {
        self.policy.set_limit(&mut self.table, limit);
    }
}
