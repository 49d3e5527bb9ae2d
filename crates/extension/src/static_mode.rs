//! Settings for linking against the statically built prefix

use crate::descriptor::ExtensionConfig;
use std::path::Path;
use xsdeps_errors::Error;
use xsdeps_types::TargetOs;

/// Macros of a static build on Linux and macOS
///
/// `XMLSEC_CRYPTO` is stored bare; finalisation adds the quoting.
pub const STATIC_MACROS: [(&str, Option<&str>); 13] = [
    ("__XMLSEC_FUNCTION__", Some("__func__")),
    ("XMLSEC_NO_SIZE_T", None),
    ("XMLSEC_NO_GOST", Some("1")),
    ("XMLSEC_NO_GOST2012", Some("1")),
    ("XMLSEC_NO_XKMS", Some("1")),
    ("XMLSEC_CRYPTO", Some("openssl")),
    ("XMLSEC_NO_CRYPTO_DYNAMIC_LOADING", Some("1")),
    ("XMLSEC_CRYPTO_OPENSSL", Some("1")),
    ("LIBXML_ICONV_ENABLED", Some("1")),
    ("LIBXML_STATIC", Some("1")),
    ("LIBXSLT_STATIC", Some("1")),
    ("XMLSEC_STATIC", Some("1")),
    ("inline", Some("__inline")),
];

/// Archives under `<prefix>/lib`, in link order
///
/// `libxmlsec1.a` appears twice: the OpenSSL backend refers back into the
/// core library and single-pass linkers need to see it again.
pub const STATIC_OBJECTS: [&str; 8] = [
    "libxmlsec1.a",
    "libxslt.a",
    "libxml2.a",
    "libz.a",
    "libxmlsec1-openssl.a",
    "libcrypto.a",
    "libiconv.a",
    "libxmlsec1.a",
];

/// Extension settings over an installed static prefix
///
/// # Errors
///
/// Returns an error if `<prefix>/include` cannot be listed.
pub fn configure(prefix: &Path, platform: &TargetOs) -> Result<ExtensionConfig, Error> {
    let mut config = ExtensionConfig::default().with_macros(STATIC_MACROS);

    let include = prefix.join("include");
    let mut subdirs = Vec::new();
    let entries = std::fs::read_dir(&include).map_err(|e| Error::io_with_path(&e, &include))?;
    for entry in entries {
        let path = entry.map_err(|e| Error::io_with_path(&e, &include))?.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();

    config.push_include_dir(include);
    for dir in subdirs {
        config.push_include_dir(dir);
    }

    if *platform == TargetOs::Linux {
        config.push_library("m");
        config.push_library("rt");
    }

    let lib = prefix.join("lib");
    for object in STATIC_OBJECTS {
        config.push_static_object(lib.join(object));
    }

    Ok(config)
}
