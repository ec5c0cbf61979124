#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod cache;

pub use builder::{ByteCapacity, EntryCapacity, MokaSnapshotCacheBuilder, NoCapacity};
pub use cache::{MokaSnapshotCache, snapshot_key};
pub use moka::policy::EvictionPolicy;
