#![warn(missing_docs)]
//! # prerender-core
//!
//! Core types for serving prerendered snapshots to crawlers.
//!
//! This crate holds the pieces that need no I/O:
//!
//! - **Rules**: the [`RuleCatalog`] of crawler user agents and static-asset
//!   extensions
//! - **Requests**: the [`SnapshotRequest`] descriptor
//! - **Classification**: the [`Classifier`] deciding snapshot
//!   [`Eligibility`]
//! - **Caching**: the [`SnapshotCache`] contract storage backends implement
//!
//! The orchestration that ties them to a rendering backend lives in the
//! `prerender` crate.

pub mod cache;
pub mod classifier;
pub mod pattern;
pub mod request;
pub mod rules;
pub mod status;

pub use cache::{CachedSnapshot, NoCache, SnapshotCache, WriteOutcome};
pub use classifier::{Classifier, Eligibility, Rejection};
pub use pattern::PatternList;
pub use request::SnapshotRequest;
pub use rules::RuleCatalog;
pub use status::RenderStatus;
