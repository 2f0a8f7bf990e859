use crate::{
    name::Name,
    packet::{Data, Interest},
    timestamp::Timestamp,
};

// What the forwarding pipeline needs from a content store.
// Data is offered on its way downstream, and Interests are checked against
//  the store before being forwarded upstream.

pub trait ContentStore {
    // Offers a Data packet to the store. Returns whether it is cached
    //  afterwards: the replacement policy may refuse it straight away.
    fn insert(&mut self, data: Data, is_unsolicited: bool, now: Timestamp) -> bool;

    // Looks for cached Data satisfying the Interest and returns its wire form.
    fn find(&mut self, interest: &Interest, now: Timestamp) -> Option<&[u8]>;

    // Management deletion of up to `limit` entries under `prefix`.
    //  Returns the number of entries erased.
    fn erase(&mut self, prefix: &Name, limit: usize) -> usize;

    // Number of cached entries
    fn size(&self) -> usize;

    // Maximum number of cached entries
    fn limit(&self) -> usize;

    // Changes the maximum, evicting right away if the store is over it
    fn set_limit(&mut self, limit: usize);
}
