use core::{borrow::Borrow, fmt};

use alloc::rc::Rc;

use crate::{
    hash::Sha256Digest,
    name::Name,
    packet::{Data, Interest},
    timestamp::Timestamp,
};

// Shared between the table and the active policy, ordered by Data name.
// A policy must drop its handle once it has evicted the entry or has been
//  told about its erasure.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryRef(Rc<Name>);

impl EntryRef {
    pub(crate) fn new(name: Name) -> Self {
        Self(Rc::new(name))
    }

    pub fn name(&self) -> &Name {
        &self.0
    }
}

impl Borrow<Name> for EntryRef {
    fn borrow(&self) -> &Name {
        &self.0
    }
}

impl fmt::Debug for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryRef({})", self.0)
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug)]
pub struct Entry {
    data: Data,
    arrival: Timestamp,
    freshness_deadline: Timestamp,
    is_unsolicited: bool,
}

impl Entry {
    pub(crate) fn new(data: Data, is_unsolicited: bool, now: Timestamp) -> Self {
        let freshness_deadline = data.freshness_deadline(now);
        Self {
            data,
            arrival: now,
            freshness_deadline,
            is_unsolicited,
        }
    }

    // Replaces the payload with a newly arrived copy of the same name.
    // An unsolicited copy cannot make a solicited entry unsolicited again.
    pub(crate) fn refresh(&mut self, data: Data, is_unsolicited: bool, now: Timestamp) {
        debug_assert!(data.name == self.data.name);
        self.freshness_deadline = data.freshness_deadline(now);
        self.data = data;
        self.arrival = now;
        self.is_unsolicited &= is_unsolicited;
    }

    pub fn name(&self) -> &Name {
        &self.data.name
    }

    pub fn full_name(&self) -> Name {
        self.data.full_name()
    }

    pub fn digest(&self) -> &Sha256Digest {
        &self.data.digest
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn payload(&self) -> &[u8] {
        &self.data.payload
    }

    pub fn arrival(&self) -> Timestamp {
        self.arrival
    }

    pub fn freshness_deadline(&self) -> Timestamp {
        self.freshness_deadline
    }

    pub fn is_fresh(&self, now: Timestamp) -> bool {
        now < self.freshness_deadline
    }

    pub fn is_stale(&self, now: Timestamp) -> bool {
        !self.is_fresh(now)
    }

    pub fn is_unsolicited(&self) -> bool {
        self.is_unsolicited
    }

    pub fn can_satisfy(&self, interest: &Interest, now: Timestamp) -> bool {
        interest.matches_data(&self.data.name, &self.data.digest)
            && (!interest.must_be_fresh || self.is_fresh(now))
    }
}
