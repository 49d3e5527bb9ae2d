//! Cross-compilation planning
//!
//! Only macOS targets are ever cross-compiled, between `x86_64` and `arm64`.

use std::collections::BTreeMap;
use sysinfo::System;
use xsdeps_types::{CrossCompileInfo, TargetOs};

const DEPLOYMENT_TARGET: &str = "MACOSX_DEPLOYMENT_TARGET";

/// The machine the orchestrator runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: TargetOs,
    /// Native machine name in the toolchain's spelling (`arm64` on macOS)
    pub machine: String,
    pub os_version: Option<String>,
}

impl HostInfo {
    /// Detect the running host
    #[must_use]
    pub fn detect() -> Self {
        let os = TargetOs::current();
        let machine = normalize_machine(&os, std::env::consts::ARCH);
        Self {
            os,
            machine,
            os_version: System::os_version(),
        }
    }

    /// Leading component of the OS version, when it is numeric
    #[must_use]
    pub fn major_version(&self) -> Option<u32> {
        self.os_version
            .as_deref()
            .and_then(|v| v.split('.').next())
            .and_then(|major| major.trim().parse().ok())
    }
}

/// Spell a machine name the way the target's toolchain does
#[must_use]
pub fn normalize_machine(os: &TargetOs, machine: &str) -> String {
    match (os, machine) {
        (TargetOs::MacOs, "aarch64") => "arm64".to_string(),
        (_, "AMD64" | "amd64") => "x86_64".to_string(),
        _ => machine.to_string(),
    }
}

/// Outcome of cross-compile planning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossPlan {
    pub info: Option<CrossCompileInfo>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    /// Variables to add to the build environment
    pub env: BTreeMap<String, String>,
}

impl CrossPlan {
    #[must_use]
    pub fn is_cross(&self) -> bool {
        self.info.is_some()
    }
}

/// Decide whether and how to cross-compile
///
/// `inherited` is the environment the build starts from; it is only read.
#[must_use]
pub fn plan(
    host: &HostInfo,
    target: &TargetOs,
    target_arch: &str,
    inherited: &BTreeMap<String, String>,
) -> CrossPlan {
    let mut plan = CrossPlan::default();
    if *target != TargetOs::MacOs {
        return plan;
    }

    if target_arch != host.machine && matches!(target_arch, "x86_64" | "arm64") {
        let arch_flag = format!("-arch {target_arch}");
        plan.cflags.push(arch_flag.clone());
        plan.ldflags.push(arch_flag);
        plan.info = Some(CrossCompileInfo::new("darwin64", target_arch, "cc"));
    }

    if host.os == TargetOs::MacOs
        && host.major_version().is_some_and(|major| major >= 11)
        && !inherited.contains_key(DEPLOYMENT_TARGET)
    {
        plan.env
            .insert(DEPLOYMENT_TARGET.to_string(), "11.0".to_string());
    }

    plan
}
