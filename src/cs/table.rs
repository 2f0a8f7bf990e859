use core::{
    ops::Bound,
    sync::atomic::{AtomicUsize, Ordering},
};

use alloc::collections::BTreeMap;

use tracing::trace;

use super::entry::{Entry, EntryRef};
use crate::{
    name::Name,
    packet::{Data, Interest},
    policy::PolicyHost,
    timestamp::Timestamp,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(usize);

impl TableId {
    pub(crate) fn next() -> Self {
        static NEXT_TABLE_ID: AtomicUsize = AtomicUsize::new(1);
        TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// The table never drops an entry on its own
pub struct Table {
    id: TableId,
    entries: BTreeMap<EntryRef, Entry>,
    now: Timestamp,
}

impl Table {
    pub fn new() -> Self {
        Self {
            id: TableId::next(),
            entries: BTreeMap::new(),
            now: Timestamp::ZERO,
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &EntryRef) -> bool {
        self.entries.contains_key(entry)
    }

    pub fn get(&self, name: &Name) -> Option<(&EntryRef, &Entry)> {
        self.entries.get_key_value(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryRef, &Entry)> + '_ {
        self.entries.iter()
    }

    // Records the time of the operation being processed, which is what
    //  the policy sees as "now"
    pub(crate) fn set_now(&mut self, now: Timestamp) {
        self.now = now;
    }

    // Refreshes the entry if the name is already stored. Returns whether
    //  the entry is new.
    pub(crate) fn insert(
        &mut self,
        data: Data,
        is_unsolicited: bool,
        now: Timestamp,
    ) -> (EntryRef, bool) {
        let existing = self.entries.get_key_value(&data.name).map(|(e, _)| e.clone());
        if let Some(entry) = existing {
            trace!(name = %entry, "refreshing");
            if let Some(existing) = self.entries.get_mut(&entry) {
                existing.refresh(data, is_unsolicited, now);
            }
            return (entry, false);
        }

        trace!(name = %data.name, is_unsolicited, "inserting");
        let entry = EntryRef::new(data.name.clone());
        self.entries
            .insert(entry.clone(), Entry::new(data, is_unsolicited, now));
        (entry, true)
    }

    pub(crate) fn erase(&mut self, entry: &EntryRef) -> Option<Entry> {
        self.entries.remove(entry)
    }

    pub fn entries_under<'a>(
        &'a self,
        prefix: &'a Name,
    ) -> impl Iterator<Item = (&'a EntryRef, &'a Entry)> + 'a {
        self.entries
            .range::<Name, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(entry, _)| prefix.is_prefix_of(entry.name()))
    }

    // With CanBePrefix, the first match in canonical order under the
    //  Interest name. Otherwise an exact or full-name match.
    pub fn find(&self, interest: &Interest, now: Timestamp) -> Option<EntryRef> {
        if let Some(name) = interest.name_without_digest() {
            if let Some((entry, e)) = self.get(&name) {
                if e.can_satisfy(interest, now) {
                    return Some(entry.clone());
                }
            }
        }

        if interest.can_be_prefix {
            self.entries_under(&interest.name)
                .find(|(_, e)| e.can_satisfy(interest, now))
                .map(|(entry, _)| entry.clone())
        } else {
            self.get(&interest.name)
                .filter(|(_, e)| e.can_satisfy(interest, now))
                .map(|(entry, _)| entry.clone())
        }
    }

    pub fn find_longest_prefix(&self, name: &Name) -> Option<EntryRef> {
        let mut candidate = Some(name.clone());
        while let Some(prefix) = candidate {
            if let Some((entry, _)) = self.get(&prefix) {
                return Some(entry.clone());
            }
            candidate = prefix.dropping_last_component();
        }
        None
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyHost for Table {
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
        let erased = self.entries.remove(entry);
        assert!(
            erased.is_some(),
            "policy evicted {} which is not in the table",
            entry
        );
    }
}
