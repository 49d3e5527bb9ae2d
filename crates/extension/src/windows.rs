//! Prebuilt dependency bundles for Windows
//!
//! Windows builds never compile the dependencies. Zip bundles from a pinned
//! release are cached next to the source archives, unpacked into the
//! scratch tree and the extension is pointed at whatever `lib` and
//! `include` directories they contain.

use crate::descriptor::ExtensionConfig;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xsdeps_builder::{extract, ArchiveCache};
use xsdeps_errors::{BuildError, Error};
use xsdeps_events::{AcquisitionEvent, AppEvent, EventEmitter};
use xsdeps_types::join_url;

/// Bundle names without their architecture suffix
pub const BUNDLES: [&str; 6] = [
    "libxml2-2.11.9-3",
    "libxslt-1.1.39",
    "zlib-1.3.1",
    "iconv-1.18-1",
    "openssl-3.0.16.pl1",
    "xmlsec-1.3.7",
];

/// Macros of a Windows build
pub const WINDOWS_MACROS: [(&str, Option<&str>); 13] = [
    ("XMLSEC_CRYPTO", Some("openssl")),
    ("__XMLSEC_FUNCTION__", Some("__FUNCTION__")),
    ("XMLSEC_NO_GOST", Some("1")),
    ("XMLSEC_NO_XKMS", Some("1")),
    ("XMLSEC_NO_CRYPTO_DYNAMIC_LOADING", Some("1")),
    ("XMLSEC_CRYPTO_OPENSSL", Some("1")),
    ("UNICODE", Some("1")),
    ("_UNICODE", Some("1")),
    ("LIBXML_ICONV_ENABLED", Some("1")),
    ("LIBXML_STATIC", Some("1")),
    ("LIBXSLT_STATIC", Some("1")),
    ("XMLSEC_STATIC", Some("1")),
    ("inline", Some("__inline")),
];

/// Import libraries of the bundles plus the system libraries they need
pub const WINDOWS_LIBRARIES: [&str; 13] = [
    "libxmlsec_a",
    "libxmlsec-openssl_a",
    "libcrypto",
    "iconv_a",
    "libxslt_a",
    "libexslt_a",
    "libxml2_a",
    "zlib",
    "WS2_32",
    "Advapi32",
    "User32",
    "Gdi32",
    "Crypt32",
];

/// Architecture suffix of the bundle files
#[must_use]
pub fn bundle_suffix(machine: &str, pointer_width: u32) -> &'static str {
    if machine.eq_ignore_ascii_case("arm64") || machine.eq_ignore_ascii_case("aarch64") {
        "win-arm64"
    } else if pointer_width >= 64 {
        "win64"
    } else {
        "win32"
    }
}

/// The bundle files for one architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSet {
    pub suffix: &'static str,
}

impl BundleSet {
    #[must_use]
    pub fn new(suffix: &'static str) -> Self {
        Self { suffix }
    }

    /// Bundles for the running machine
    #[must_use]
    pub fn detect() -> Self {
        Self::new(bundle_suffix(std::env::consts::ARCH, usize::BITS))
    }

    #[must_use]
    pub fn filenames(&self) -> Vec<String> {
        BUNDLES
            .iter()
            .map(|bundle| format!("{bundle}.{}.zip", self.suffix))
            .collect()
    }

    /// Download every bundle that is not cached yet
    ///
    /// # Errors
    ///
    /// Returns the first download failure.
    pub async fn fetch(&self, cache: &ArchiveCache) -> Result<Vec<PathBuf>, Error> {
        let mut paths = Vec::new();
        for (bundle, filename) in BUNDLES.iter().zip(self.filenames()) {
            let url = join_url(&cache.endpoints().windows_bundles, &filename);
            paths.push(cache.ensure_file(bundle, &filename, &url).await?);
        }
        Ok(paths)
    }
}

/// Unpack every cached zip into `scratch_dir`
///
/// All zips in the cache are unpacked, not only the current bundle set.
///
/// # Errors
///
/// Returns the first extraction failure.
pub async fn unpack_cached(
    cache: &ArchiveCache,
    scratch_dir: &Path,
    tx: &impl EventEmitter,
) -> Result<(), Error> {
    for archive in cache.matching("*.zip").await? {
        tx.emit(AppEvent::Acquisition(AcquisitionEvent::ExtractStarted {
            archive: archive.clone(),
            destination: scratch_dir.to_path_buf(),
        }));
        extract(&archive, scratch_dir).await?;
        tx.emit(AppEvent::Acquisition(AcquisitionEvent::ExtractCompleted { archive }));
    }
    Ok(())
}

/// Extension settings over the unpacked bundle tree
///
/// # Errors
///
/// Returns `SourceDirMissing` if no bundle ships an `include/xmlsec`
/// directory.
pub fn configure(scratch_dir: &Path) -> Result<ExtensionConfig, Error> {
    let mut config = ExtensionConfig::default().with_macros(WINDOWS_MACROS);
    for library in WINDOWS_LIBRARIES {
        config.push_library(library);
    }

    let mut includes = Vec::new();
    for entry in WalkDir::new(scratch_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = std::path::absolute(entry.path())?;
        match entry.file_name().to_str() {
            Some("lib") => config.push_library_dir(path),
            Some("include") => includes.push(path),
            _ => {}
        }
    }

    let xmlsec = includes
        .iter()
        .map(|dir| dir.join("xmlsec"))
        .find(|dir| dir.is_dir())
        .ok_or_else(|| BuildError::SourceDirMissing {
            pattern: "include/xmlsec".to_string(),
            path: scratch_dir.display().to_string(),
        })?;
    for dir in includes {
        config.push_include_dir(dir);
    }
    config.push_include_dir(xmlsec);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix() {
        assert_eq!(bundle_suffix("ARM64", 64), "win-arm64");
        assert_eq!(bundle_suffix("aarch64", 64), "win-arm64");
        assert_eq!(bundle_suffix("x86_64", 64), "win64");
        assert_eq!(bundle_suffix("x86", 32), "win32");
    }

    #[test]
    fn test_filenames() {
        let names = BundleSet::new("win64").filenames();
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "libxml2-2.11.9-3.win64.zip");
        assert_eq!(names[5], "xmlsec-1.3.7.win64.zip");
    }

    #[test]
    fn test_configure_from_tree() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        for dir in [
            "libxml2/include/libxml",
            "libxml2/lib",
            "xmlsec/include/xmlsec",
            "xmlsec/lib",
            "zlib/include",
        ] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }

        let config = configure(root).unwrap();
        assert_eq!(
            config.library_dirs(),
            [root.join("libxml2/lib"), root.join("xmlsec/lib")]
        );
        assert_eq!(
            config.include_dirs(),
            [
                root.join("libxml2/include"),
                root.join("xmlsec/include"),
                root.join("zlib/include"),
                root.join("xmlsec/include/xmlsec"),
            ]
        );
        assert_eq!(config.libraries().len(), 13);
        assert_eq!(config.macro_value("UNICODE"), Some(Some("1")));
        assert_eq!(config.macro_value("XMLSEC_NO_SIZE_T"), None);
        assert_eq!(config.macro_value("XMLSEC_NO_GOST2012"), None);
        assert!(config.static_objects().is_empty());
    }

    #[test]
    fn test_missing_xmlsec_headers() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("zlib/include")).unwrap();
        assert!(matches!(
            configure(temp.path()),
            Err(Error::Build(BuildError::SourceDirMissing { .. }))
        ));
    }
}
