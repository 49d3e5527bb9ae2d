//! The extension build descriptor

use serde::Serialize;
use std::path::PathBuf;

/// A preprocessor definition: name and optional value
pub type MacroDef = (String, Option<String>);

/// Settings handed to the external native build of the extension
///
/// Values are produced by the configuration functions of this crate and are
/// read-only for everyone else. Static objects keep the link order they were
/// produced in; entries are never sorted or deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionConfig {
    macros: Vec<MacroDef>,
    include_dirs: Vec<PathBuf>,
    library_dirs: Vec<PathBuf>,
    libraries: Vec<String>,
    static_objects: Vec<PathBuf>,
    extra_compile_args: Vec<String>,
}

impl ExtensionConfig {
    #[must_use]
    pub fn macros(&self) -> &[MacroDef] {
        &self.macros
    }

    /// Value of the first macro called `name`
    #[must_use]
    pub fn macro_value(&self, name: &str) -> Option<Option<&str>> {
        self.macros
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_deref())
    }

    #[must_use]
    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    #[must_use]
    pub fn library_dirs(&self) -> &[PathBuf] {
        &self.library_dirs
    }

    #[must_use]
    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    #[must_use]
    pub fn static_objects(&self) -> &[PathBuf] {
        &self.static_objects
    }

    #[must_use]
    pub fn extra_compile_args(&self) -> &[String] {
        &self.extra_compile_args
    }

    pub(crate) fn with_macros<I, K>(mut self, macros: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<&'static str>)>,
        K: Into<String>,
    {
        self.macros.extend(
            macros
                .into_iter()
                .map(|(name, value)| (name.into(), value.map(str::to_string))),
        );
        self
    }

    pub(crate) fn push_macro(&mut self, name: impl Into<String>, value: Option<String>) {
        self.macros.push((name.into(), value));
    }

    pub(crate) fn macros_mut(&mut self) -> &mut Vec<MacroDef> {
        &mut self.macros
    }

    pub(crate) fn push_include_dir(&mut self, dir: impl Into<PathBuf>) {
        self.include_dirs.push(dir.into());
    }

    pub(crate) fn push_library_dir(&mut self, dir: impl Into<PathBuf>) {
        self.library_dirs.push(dir.into());
    }

    pub(crate) fn push_library(&mut self, name: impl Into<String>) {
        self.libraries.push(name.into());
    }

    pub(crate) fn push_static_object(&mut self, path: impl Into<PathBuf>) {
        self.static_objects.push(path.into());
    }

    pub(crate) fn push_compile_arg(&mut self, arg: impl Into<String>) {
        self.extra_compile_args.push(arg.into());
    }
}
