use alloc::{collections::BTreeMap, vec::Vec};

use crate::cs::EntryRef;

// An ordered queue of entries supporting removal from anywhere.
// Order is by a sequence number assigned on push, so two queues fed the
//  same operations always yield the same order.
#[derive(Default)]
pub(crate) struct CleanupQueue {
    by_sequence: BTreeMap<u64, EntryRef>,
    by_entry: BTreeMap<EntryRef, u64>,
    next_sequence: u64,
}

impl CleanupQueue {
    pub fn len(&self) -> usize {
        self.by_entry.len()
    }

    pub fn contains(&self, entry: &EntryRef) -> bool {
        self.by_entry.contains_key(entry)
    }

    // An entry that is already queued is moved to the back instead.
    //  Returns the sequence number the entry is now queued under.
    pub fn push_back(&mut self, entry: EntryRef) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if let Some(previous) = self.by_entry.insert(entry.clone(), sequence) {
            self.by_sequence.remove(&previous);
        }
        self.by_sequence.insert(sequence, entry);
        sequence
    }

    pub fn remove(&mut self, entry: &EntryRef) -> bool {
        match self.by_entry.remove(entry) {
            Some(sequence) => {
                self.by_sequence.remove(&sequence);
                true
            }
            None => false,
        }
    }

    // Returns false, and does nothing, if the entry is not queued
    pub fn move_to_back(&mut self, entry: &EntryRef) -> bool {
        if !self.remove(entry) {
            return false;
        }
        self.push_back(entry.clone());
        true
    }

    pub fn pop_front(&mut self) -> Option<EntryRef> {
        let (_, entry) = self.by_sequence.pop_first()?;
        self.by_entry.remove(&entry);
        Some(entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryRef> + '_ {
        self.by_sequence.values()
    }

    pub fn to_vec(&self) -> Vec<EntryRef> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::CleanupQueue;
    use crate::cs::EntryRef;

    fn entry(uri: &str) -> EntryRef {
        EntryRef::new(uri.parse().unwrap())
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = CleanupQueue::default();
        assert!(queue.pop_front().is_none());

        queue.push_back(entry("/c"));
        queue.push_back(entry("/a"));
        queue.push_back(entry("/b"));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.iter().next(), Some(&entry("/c")));

        assert!(queue.move_to_back(&entry("/c")));
        assert!(!queue.move_to_back(&entry("/x")));
        assert!(queue.remove(&entry("/b")));
        assert!(!queue.remove(&entry("/b")));

        assert_eq!(queue.to_vec(), [entry("/a"), entry("/c")]);
        assert_eq!(queue.pop_front(), Some(entry("/a")));
        assert!(!queue.contains(&entry("/a")));
        assert_eq!(queue.pop_front(), Some(entry("/c")));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_push_existing_moves_it() {
        let mut queue = CleanupQueue::default();
        let first = queue.push_back(entry("/a"));
        queue.push_back(entry("/b"));
        assert!(queue.push_back(entry("/a")) > first);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.to_vec(), [entry("/b"), entry("/a")]);
    }
}
