//! Tag classification and incremental build-matrix selection
//!
//! This module turns a raw registry tag listing into the sets of tags that still
//! need to be built, split by target architecture.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  TagSource  │────▶│  Selection  │────▶│    Diff     │────▶ output
//! │   (fetch)   │     │ (classify)  │     │ (baseline)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   ▲
//!                            ▼                   │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Semver    │     │ State file  │
//!                     │   (parse)   │     │ or listing  │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`semver`]: Tag to version parsing and precedence helpers
//! - [`classifier`]: Architecture and maturity labels for a tag
//! - [`selection`]: Builds arm64/amd64/multi candidate sets from a listing
//! - [`diff`]: Subtracts already-processed tags from a selection
//! - [`state`]: JSON file record of tags selected in previous runs
//! - [`registry`]: Traits for the source and downstream registries
//! - [`registries`]: Concrete registry clients (MCR, GitHub Packages)
//! - [`error`]: Error types for registry, selection and state operations
//! - [`types`]: `TagSet`, `Category` and selection result types

pub mod classifier;
pub mod diff;
pub mod error;
pub mod registries;
pub mod registry;
pub mod selection;
pub mod semver;
pub mod state;
pub mod types;
