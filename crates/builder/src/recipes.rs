//! Configure, build and install commands of each dependency

use crate::environment::BuildEnvironment;
use crate::runner::Invocation;
use xsdeps_errors::BuildStep;
use xsdeps_types::DependencyKind;

/// One native step, not yet bound to a directory or environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeStep {
    pub step: BuildStep,
    pub invocation: Invocation,
}

impl RecipeStep {
    fn new(step: BuildStep, invocation: Invocation) -> Self {
        Self { step, invocation }
    }
}

/// Environment changes that take effect before `kind` is configured
pub fn prepare_environment(kind: DependencyKind, env: &mut BuildEnvironment) {
    if kind == DependencyKind::Xmlsec1 {
        env.append_ldflag("-lpthread");
    }
}

/// The configure, build and install steps of `kind`, in order
#[must_use]
pub fn recipe(kind: DependencyKind, env: &BuildEnvironment) -> Vec<RecipeStep> {
    let make = || Invocation::new("make").arg(env.jobs_arg());

    match kind {
        DependencyKind::OpenSsl => vec![
            RecipeStep::new(BuildStep::Configure, openssl_configure(env)),
            RecipeStep::new(BuildStep::Build, make()),
            RecipeStep::new(BuildStep::Install, make().arg("install_sw")),
        ],
        DependencyKind::Xmlsec1 => {
            let include = env.layout().include_dir();
            vec![
                RecipeStep::new(BuildStep::Configure, autoconf(kind, env)),
                RecipeStep::new(
                    BuildStep::Build,
                    make().args([
                        format!("-I{}", include.display()),
                        format!("-I{}", include.join("libxml").display()),
                    ]),
                ),
                RecipeStep::new(BuildStep::Install, make().arg("install")),
            ]
        }
        _ => vec![
            RecipeStep::new(BuildStep::Configure, autoconf(kind, env)),
            RecipeStep::new(BuildStep::Build, make()),
            RecipeStep::new(BuildStep::Install, make().arg("install")),
        ],
    }
}

fn openssl_configure(env: &BuildEnvironment) -> Invocation {
    let script = if env.cross().is_some() {
        "./Configure"
    } else {
        "./config"
    };
    let mut invocation = Invocation::new(script).args([
        env.prefix_arg(),
        "no-shared".to_string(),
        "-fPIC".to_string(),
        "--libdir=lib".to_string(),
    ]);
    // AES assembly on riscv64 produces relocations that do not reach in a
    // static link
    if env.target_arch() == "riscv64" {
        invocation = invocation.arg("no-asm");
    }
    if let Some(cross) = env.cross() {
        invocation = invocation.arg(cross.triplet());
    }
    invocation
}

fn autoconf(kind: DependencyKind, env: &BuildEnvironment) -> Invocation {
    let prefix = env.layout().prefix_dir.display().to_string();
    let invocation = Invocation::new("./configure").arg(env.prefix_arg());

    let invocation = match kind {
        // zlib's hand-written configure rejects --host
        DependencyKind::Zlib => return invocation,
        DependencyKind::Libiconv => {
            invocation.args(["--disable-dependency-tracking", "--disable-shared"])
        }
        DependencyKind::Libxml2 => invocation.args([
            "--disable-dependency-tracking".to_string(),
            "--disable-shared".to_string(),
            "--without-lzma".to_string(),
            "--without-python".to_string(),
            format!("--with-iconv={prefix}"),
            format!("--with-zlib={prefix}"),
        ]),
        DependencyKind::Libxslt => invocation.args([
            "--disable-dependency-tracking".to_string(),
            "--disable-shared".to_string(),
            "--without-python".to_string(),
            "--without-crypto".to_string(),
            format!("--with-libxml-prefix={prefix}"),
        ]),
        DependencyKind::Xmlsec1 => invocation.args([
            "--disable-shared".to_string(),
            "--disable-gost".to_string(),
            "--enable-md5".to_string(),
            "--enable-ripemd160".to_string(),
            "--disable-crypto-dl".to_string(),
            "--enable-static=yes".to_string(),
            "--enable-shared=no".to_string(),
            "--enable-static-linking=yes".to_string(),
            "--with-default-crypto=openssl".to_string(),
            format!("--with-openssl={prefix}"),
            format!("--with-libxml={prefix}"),
            format!("--with-libxslt={prefix}"),
        ]),
        DependencyKind::OpenSsl => return openssl_configure(env),
    };

    match env.host_arg() {
        Some(host) => invocation.arg(host),
        None => invocation,
    }
}
