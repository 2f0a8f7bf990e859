use alloc::boxed::Box;

use crate::{
    hash::Sha256Digest,
    name::{Name, NameComponent},
    timestamp::Timestamp,
};

// Owned views of the two NDN packet types the content store deals with.
// Wire decoding happens before the store is reached, so Data keeps its
//  encoded form as an opaque payload together with the parsed fields we need.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interest {
    pub name: Name,
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            can_be_prefix: false,
            must_be_fresh: false,
        }
    }

    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    // For an Interest addressed by full name
    pub(crate) fn name_without_digest(&self) -> Option<Name> {
        match self.name.last_component() {
            Some(c) if c.is_implicit_digest() => self.name.dropping_last_component(),
            _ => None,
        }
    }

    // Ignores freshness
    pub fn matches_data(&self, data_name: &Name, digest: &Sha256Digest) -> bool {
        let interest_len = self.name.component_count();
        let data_len = data_name.component_count();

        if interest_len == data_len + 1 {
            // The last Interest component may be the implicit digest of this Data
            return match self.name.last_component() {
                Some(c) if c.is_implicit_digest() => {
                    c.bytes.as_ref() == digest.0.as_slice()
                        && self.name.prefix(data_len) == *data_name
                }
                _ => false,
            };
        }

        if self.can_be_prefix {
            self.name.is_prefix_of(data_name)
        } else {
            self.name == *data_name
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Data {
    pub name: Name,
    pub digest: Sha256Digest,
    // Zero (the NDN default when the field is absent) means never fresh
    pub freshness_period: u64,
    pub payload: Box<[u8]>,
}

impl Data {
    // `payload` is the full wire encoding, which the implicit digest covers
    #[cfg(feature = "sha2")]
    pub fn new(name: Name, payload: &[u8]) -> Self {
        let mut hasher = crate::hash::Sha256Hasher::new();
        let digest = Sha256Digest::compute(&mut hasher, payload);
        Self::with_digest(name, digest, payload)
    }

    pub fn with_digest(name: Name, digest: Sha256Digest, payload: &[u8]) -> Self {
        Self {
            name,
            digest,
            freshness_period: 0,
            payload: Box::from(payload),
        }
    }

    pub fn with_freshness_period(mut self, freshness_period_ms: u64) -> Self {
        self.freshness_period = freshness_period_ms;
        self
    }

    pub fn full_name(&self) -> Name {
        self.name
            .adding_component(NameComponent::implicit_digest(&self.digest.0))
    }

    // The Data is fresh strictly before this moment
    pub(crate) fn freshness_deadline(&self, arrival: Timestamp) -> Timestamp {
        arrival.adding(self.freshness_period)
    }
}
