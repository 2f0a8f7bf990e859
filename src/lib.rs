//#![warn(missing_docs)]

#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub mod timestamp;

pub mod hash;

pub mod error;

pub mod name;

pub mod packet;

pub mod signal;

pub mod config;

pub mod store;

pub mod cs;

pub mod policy;

pub use config::CsConfig;
pub use cs::{Cs, CsCounters, Entry, EntryRef, Table, TableId};
pub use error::CsError;
pub use name::{Name, NameComponent};
pub use packet::{Data, Interest};
pub use policy::{
    lru::LruPolicy, priority_fifo::PriorityFifoPolicy, Policy, PolicyRegistry, RegisteredPolicy,
    ReplacementPolicy,
};
pub use store::ContentStore;
pub use timestamp::Timestamp;
