//! Settings shared by every configuration path

use crate::descriptor::ExtensionConfig;
use std::path::PathBuf;
use xsdeps_builder::{CommandRunner, Invocation};
use xsdeps_errors::{Error, ExtensionError};
use xsdeps_types::TargetOs;

const CRYPTO_MACRO: &str = "XMLSEC_CRYPTO";

const UNIX_COMPILE_ARGS: [&str; 6] = [
    "-g",
    "-std=c99",
    "-fPIC",
    "-fno-strict-aliasing",
    "-Wno-error=declaration-after-statement",
    "-Werror=implicit-function-declaration",
];

/// Build flavour of the extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOptions {
    pub platform: TargetOs,
    pub module_name: Option<String>,
    pub module_version: Option<String>,
    pub debug: bool,
    pub optimize_size: bool,
}

/// Where the lxml headers come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTreeSource {
    /// Explicit directories; the interpreter is not consulted when set
    pub include_dirs: Vec<PathBuf>,
    pub python: String,
}

/// lxml include directories
///
/// # Errors
///
/// Returns `XmlTreeIncludeUnavailable` if no directories are configured and
/// the interpreter cannot report them.
pub async fn xml_tree_include_dirs(
    source: &XmlTreeSource,
    runner: &dyn CommandRunner,
) -> Result<Vec<PathBuf>, Error> {
    if !source.include_dirs.is_empty() {
        return Ok(source.include_dirs.clone());
    }

    let unavailable = |message: String| ExtensionError::XmlTreeIncludeUnavailable { message };
    let probe = Invocation::new(&source.python).args([
        "-c",
        "import os, lxml; print(os.pathsep.join(lxml.get_include()))",
    ]);
    let output = runner
        .capture(&probe)
        .await
        .map_err(|e| unavailable(e.to_string()))?;
    if !output.status.success() {
        return Err(unavailable(format!("{} ({})", output.stderr.trim(), output.status)).into());
    }

    let dirs: Vec<PathBuf> = std::env::split_paths(output.stdout.trim())
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    if dirs.is_empty() {
        return Err(unavailable(format!("{} printed no directories", source.python)).into());
    }
    Ok(dirs)
}

/// Quote the `XMLSEC_CRYPTO` value for the C preprocessor
///
/// The first entry is rewritten in place to `"value"`. A plain quoted value
/// is left alone and a shell-escaped one (`\"value\"`, as pkg-config prints
/// it) loses its backslashes, so applying this twice changes nothing.
#[must_use]
pub fn quote_crypto_macro(mut config: ExtensionConfig) -> ExtensionConfig {
    if let Some((_, Some(value))) = config
        .macros_mut()
        .iter_mut()
        .find(|(name, _)| name == CRYPTO_MACRO)
    {
        let bare = value
            .strip_prefix("\\\"")
            .and_then(|rest| rest.strip_suffix("\\\""))
            .or_else(|| {
                value
                    .strip_prefix('"')
                    .and_then(|rest| rest.strip_suffix('"'))
            })
            .unwrap_or(value.as_str());
        let quoted = format!("\"{bare}\"");
        *value = quoted;
    }
    config
}

/// Add the lxml headers, module identity, crypto quoting and compiler flags
#[must_use]
pub fn finalize(
    mut config: ExtensionConfig,
    xml_tree_dirs: &[PathBuf],
    options: &FinalizeOptions,
) -> ExtensionConfig {
    for dir in xml_tree_dirs {
        config.push_include_dir(dir);
    }
    if let Some(name) = &options.module_name {
        config.push_macro("MODULE_NAME", Some(name.clone()));
    }
    if let Some(version) = &options.module_version {
        config.push_macro("MODULE_VERSION", Some(version.clone()));
    }

    let mut config = quote_crypto_macro(config);

    let windows = options.platform == TargetOs::Windows;
    if windows {
        config.push_compile_arg("/Zi");
    } else {
        for arg in UNIX_COMPILE_ARGS {
            config.push_compile_arg(arg);
        }
    }

    if options.debug {
        config.push_macro("PYXMLSEC_ENABLE_DEBUG", Some("1".to_string()));
        if windows {
            config.push_compile_arg("/Od");
        } else {
            config.push_compile_arg("-Wall");
            config.push_compile_arg("-O0");
        }
    } else if options.optimize_size {
        config.push_compile_arg(if windows { "/Os" } else { "-Os" });
    }

    config
}
