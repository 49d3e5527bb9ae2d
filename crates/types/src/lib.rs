#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the xsdeps build orchestrator
//!
//! This crate provides the static dependency table, upstream release
//! channels, version ordering and platform descriptions shared by the
//! resolver, builder and extension crates.

pub mod channel;
pub mod dependency;
pub mod endpoints;
pub mod platform;
pub mod version;

pub use channel::{ReleaseAsset, ReleaseChannel};
pub use dependency::{DependencyKind, DependencySpec};
pub use endpoints::{join_url, Endpoints};
pub use platform::{CrossCompileInfo, TargetOs};
pub use version::DottedVersion;
