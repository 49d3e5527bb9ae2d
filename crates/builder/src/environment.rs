//! Build environment threaded through every pipeline step

use crate::cross::CrossPlan;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use xsdeps_errors::Error;
use xsdeps_types::CrossCompileInfo;

/// Directories used by one orchestrator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Shared installation prefix (absolute)
    pub prefix_dir: PathBuf,
    /// Where archives are extracted
    pub scratch_dir: PathBuf,
    /// Flat archive cache
    pub cache_dir: PathBuf,
}

impl BuildLayout {
    /// Layout rooted at `build_root` without touching the filesystem
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new(build_root: &Path, cache_dir: &Path) -> Result<Self, Error> {
        Ok(Self {
            prefix_dir: std::path::absolute(build_root.join("prefix"))?,
            scratch_dir: build_root.join("libs"),
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    /// Create every directory of the layout
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub async fn create_dirs(&self) -> Result<(), Error> {
        for dir in [&self.prefix_dir, &self.scratch_dir, &self.cache_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::io_with_path(&e, dir))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn include_dir(&self) -> PathBuf {
        self.prefix_dir.join("include")
    }

    #[must_use]
    pub fn lib_dir(&self) -> PathBuf {
        self.prefix_dir.join("lib")
    }
}

/// Environment of the native builds
///
/// `CFLAGS` and `LDFLAGS` are kept as ordered flag lists and written into the
/// variable map whenever they change.
#[derive(Debug, Clone)]
pub struct BuildEnvironment {
    layout: BuildLayout,
    vars: BTreeMap<String, String>,
    cflags: Vec<String>,
    ldflags: Vec<String>,
    cross: Option<CrossCompileInfo>,
    target_arch: String,
    jobs: usize,
}

impl BuildEnvironment {
    /// Start from `inherited`, add `-fPIC` and the cross plan's flags
    #[must_use]
    pub fn new(
        layout: BuildLayout,
        inherited: BTreeMap<String, String>,
        plan: CrossPlan,
        target_arch: impl Into<String>,
        jobs: usize,
    ) -> Self {
        let mut cflags: Vec<String> = inherited
            .get("CFLAGS")
            .filter(|v| !v.is_empty())
            .cloned()
            .into_iter()
            .collect();
        cflags.push("-fPIC".to_string());
        cflags.extend(plan.cflags);

        let mut ldflags: Vec<String> = inherited
            .get("LDFLAGS")
            .filter(|v| !v.is_empty())
            .cloned()
            .into_iter()
            .collect();
        ldflags.extend(plan.ldflags);

        let mut vars = inherited;
        vars.extend(plan.env);

        let mut env = Self {
            layout,
            vars,
            cflags,
            ldflags,
            cross: plan.info,
            target_arch: target_arch.into(),
            jobs: jobs.max(1),
        };
        env.sync_flags();
        env
    }

    /// Snapshot of the current process environment
    #[must_use]
    pub fn process_env() -> BTreeMap<String, String> {
        std::env::vars().collect()
    }

    fn sync_flags(&mut self) {
        self.vars.insert("CFLAGS".to_string(), self.cflags.join(" "));
        self.vars.insert("LDFLAGS".to_string(), self.ldflags.join(" "));
    }

    /// Append a linker flag for every following step
    pub fn append_ldflag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        if !self.ldflags.contains(&flag) {
            self.ldflags.push(flag);
            self.sync_flags();
        }
    }

    #[must_use]
    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    #[must_use]
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn cross(&self) -> Option<&CrossCompileInfo> {
        self.cross.as_ref()
    }

    /// Architecture the dependencies are built for
    #[must_use]
    pub fn target_arch(&self) -> &str {
        &self.target_arch
    }

    #[must_use]
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    #[must_use]
    pub fn jobs_arg(&self) -> String {
        format!("-j{}", self.jobs)
    }

    #[must_use]
    pub fn prefix_arg(&self) -> String {
        format!("--prefix={}", self.layout.prefix_dir.display())
    }

    /// `--host=<arch>` for autoconf projects when cross-compiling
    #[must_use]
    pub fn host_arg(&self) -> Option<String> {
        self.cross.as_ref().map(|c| format!("--host={}", c.arch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BuildLayout {
        BuildLayout {
            prefix_dir: PathBuf::from("/b/prefix"),
            scratch_dir: PathBuf::from("/b/libs"),
            cache_dir: PathBuf::from("/libs"),
        }
    }

    #[test]
    fn test_inherited_flags_come_first() {
        let inherited = BTreeMap::from([
            ("CFLAGS".to_string(), "-O2".to_string()),
            ("LDFLAGS".to_string(), "-L/opt/lib".to_string()),
        ]);
        let plan = CrossPlan {
            info: Some(CrossCompileInfo::new("darwin64", "x86_64", "cc")),
            cflags: vec!["-arch x86_64".to_string()],
            ldflags: vec!["-arch x86_64".to_string()],
            env: BTreeMap::new(),
        };
        let env = BuildEnvironment::new(layout(), inherited, plan, "x86_64", 4);

        assert_eq!(env.var("CFLAGS"), Some("-O2 -fPIC -arch x86_64"));
        assert_eq!(env.var("LDFLAGS"), Some("-L/opt/lib -arch x86_64"));
        assert_eq!(env.host_arg().as_deref(), Some("--host=x86_64"));
    }

    #[test]
    fn test_native_defaults() {
        let mut env = BuildEnvironment::new(
            layout(),
            BTreeMap::new(),
            CrossPlan::default(),
            "x86_64",
            0,
        );
        assert_eq!(env.var("CFLAGS"), Some("-fPIC"));
        assert_eq!(env.var("LDFLAGS"), Some(""));
        assert_eq!(env.jobs_arg(), "-j1");
        assert!(env.host_arg().is_none());
        assert_eq!(env.prefix_arg(), "--prefix=/b/prefix");

        env.append_ldflag("-lpthread");
        env.append_ldflag("-lpthread");
        assert_eq!(env.var("LDFLAGS"), Some("-lpthread"));
    }
}
