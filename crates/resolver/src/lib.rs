#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Release discovery for xsdeps
//!
//! Each dependency publishes releases through exactly one channel: an HTML
//! directory index, a GNOME `cache.json` manifest or a hosted release API.
//! This crate turns a channel into the download URL of the newest release.

mod html;
mod manifest;
mod release_api;
mod resolver;

pub use html::{collect_hrefs, compile_pattern, href_version, select_latest};
pub use manifest::latest_tar_xz;
pub use release_api::{Asset, LatestRelease};
pub use resolver::ReleaseResolver;
