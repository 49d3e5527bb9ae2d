#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! Compiler and linker settings for the xmlsec Python extension
//!
//! Every configuration path ends in an immutable [`ExtensionConfig`]: the
//! static-build settings over the shared prefix, the settings reported by
//! pkg-config, or the settings over the prebuilt Windows bundles. The
//! [`strategy`] module picks the path for a platform and applies the common
//! finalisation.

pub mod descriptor;
pub mod dynamic;
pub mod finalize;
pub mod static_mode;
pub mod strategy;
pub mod windows;

pub use descriptor::{ExtensionConfig, MacroDef};
pub use finalize::{
    finalize, quote_crypto_macro, xml_tree_include_dirs, FinalizeOptions, XmlTreeSource,
};
pub use strategy::{select, select_and_run, Strategy, StrategyContext, StrategyOptions};
pub use windows::{bundle_suffix, BundleSet};
