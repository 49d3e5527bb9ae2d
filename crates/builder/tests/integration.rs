//! Integration tests for builder crate

#[cfg(test)]
mod tests {
    use async_compression::tokio::bufread::{GzipEncoder, XzEncoder};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use xsdeps_builder::*;
    use xsdeps_errors::{BuildError, BuildStep, Error};
    use xsdeps_events::{channel, AcquisitionEvent, AppEvent};
    use xsdeps_net::NetClient;
    use xsdeps_types::{DependencyKind, DependencySpec, Endpoints};

    /// Pseudo-random bytes that do not compress away
    fn noise(len: usize) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect()
    }

    fn tarball(top: &str, payload: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let script = b"#!/bin/sh\nexit 0\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(script.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{top}/configure"), &script[..])
            .unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{top}/data.bin"), payload)
            .unwrap();
        builder.into_inner().unwrap()
    }

    async fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzipEncoder::new(bytes).read_to_end(&mut out).await.unwrap();
        out
    }

    async fn xz(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        XzEncoder::new(bytes).read_to_end(&mut out).await.unwrap();
        out
    }

    fn layout(root: &Path) -> BuildLayout {
        BuildLayout::new(&root.join("build"), &root.join("cache")).unwrap()
    }

    fn native_env(root: &Path) -> BuildEnvironment {
        BuildEnvironment::new(
            layout(root),
            BTreeMap::new(),
            CrossPlan::default(),
            "x86_64",
            4,
        )
    }

    fn seed_source_dirs(scratch: &Path) {
        for dir in [
            "openssl-3.6.0",
            "zlib-1.3.1",
            "libiconv-1.18",
            "libxml2-2.14.6",
            "libxslt-1.1.43",
            "xmlsec1-1.3.9",
        ] {
            std::fs::create_dir_all(scratch.join(dir)).unwrap();
        }
    }

    fn working_dir(inv: &Invocation) -> String {
        inv.working_dir
            .as_ref()
            .and_then(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_extract_keeps_top_level_directory() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("zlib.tar.gz");
        std::fs::write(&archive, gzip(&tarball("zlib-1.3.1", b"hello")).await).unwrap();

        let dest = temp.path().join("out");
        extract(&archive, &dest).await.unwrap();

        assert!(dest.join("zlib-1.3.1/configure").is_file());
        assert_eq!(std::fs::read(dest.join("zlib-1.3.1/data.bin")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_extract_xz() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("libxml2.tar.xz");
        std::fs::write(&archive, xz(&tarball("libxml2-2.14.6", b"xml")).await).unwrap();

        let dest = temp.path().join("out");
        extract(&archive, &dest).await.unwrap();
        assert!(dest.join("libxml2-2.14.6/configure").is_file());
    }

    #[tokio::test]
    async fn test_truncated_gzip_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let full = gzip(&tarball("openssl-3.6.0", &noise(256 * 1024))).await;
        let archive = temp.path().join("openssl.tar.gz");
        std::fs::write(&archive, &full[..full.len() / 2]).unwrap();

        let result = extract(&archive, &temp.path().join("out")).await;
        match result {
            Err(Error::Build(BuildError::CorruptArchive { file, .. })) => {
                assert_eq!(file, "openssl.tar.gz");
            }
            other => panic!("expected corrupt archive, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_archive_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("zlib.tar.gz");
        std::fs::write(&archive, b"").unwrap();

        let result = extract(&archive, &temp.path().join("out")).await;
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::CorruptArchive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_other_failures_are_not_corruption() {
        let temp = tempfile::tempdir().unwrap();

        let unknown = temp.path().join("sources.rar");
        std::fs::write(&unknown, b"data").unwrap();
        assert!(matches!(
            extract(&unknown, &temp.path().join("out")).await,
            Err(Error::Build(BuildError::UnsupportedArchiveFormat { .. }))
        ));

        // A well-formed zip under a gzip tarball's name
        let mislabelled = temp.path().join("zlib.tar.gz");
        {
            use std::io::Write;
            let mut writer = zip::ZipWriter::new(std::fs::File::create(&mislabelled).unwrap());
            writer
                .start_file(
                    "zlib-1.3.1/configure",
                    zip::write::SimpleFileOptions::default(),
                )
                .unwrap();
            writer.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
            writer.finish().unwrap();
        }
        let result = extract(&mislabelled, &temp.path().join("zipped")).await;
        assert!(
            matches!(
                result,
                Err(Error::Build(BuildError::ExtractionFailed { ref message }))
                    if message.contains("zip")
            ),
            "{result:?}"
        );
        std::fs::remove_file(&mislabelled).unwrap();

        // Destination is a regular file
        let archive = temp.path().join("zlib.tar.gz");
        std::fs::write(&archive, gzip(&tarball("zlib-1.3.1", b"x")).await).unwrap();
        let blocked = temp.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();
        assert!(matches!(
            extract(&archive, &blocked).await,
            Err(Error::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_pipeline_runs_in_build_order() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = native_env(temp.path());
        env.layout().create_dirs().await.unwrap();
        seed_source_dirs(&env.layout().scratch_dir);

        let runner = Arc::new(RecordingRunner::new());
        let summary = Pipeline::new(runner.clone()).run(&mut env).await.unwrap();

        assert_eq!(summary.built, DependencyKind::BUILD_ORDER);
        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 18);

        let dirs: Vec<String> = invocations.iter().step_by(3).map(working_dir).collect();
        assert_eq!(
            dirs,
            [
                "openssl-3.6.0",
                "zlib-1.3.1",
                "libiconv-1.18",
                "libxml2-2.14.6",
                "libxslt-1.1.43",
                "xmlsec1-1.3.9"
            ]
        );
        assert_eq!(invocations[0].program, "./config");
        assert_eq!(invocations[2].args.last().map(String::as_str), Some("install_sw"));

        // -lpthread only reaches xmlsec1
        let libxslt = &invocations[12];
        let xmlsec1 = &invocations[15];
        assert_eq!(libxslt.env.get("LDFLAGS").map(String::as_str), Some(""));
        assert_eq!(xmlsec1.env.get("LDFLAGS").map(String::as_str), Some("-lpthread"));
        assert_eq!(xmlsec1.env.get("CFLAGS").map(String::as_str), Some("-fPIC"));
    }

    #[tokio::test]
    async fn test_failed_step_stops_later_dependencies() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = native_env(temp.path());
        env.layout().create_dirs().await.unwrap();
        seed_source_dirs(&env.layout().scratch_dir);

        let runner = Arc::new(RecordingRunner::new().failing_when(|inv| {
            inv.program == "./configure" && working_dir(inv).starts_with("libiconv")
        }));
        let result = Pipeline::new(runner.clone()).run(&mut env).await;

        match result {
            Err(Error::Build(BuildError::StepFailed {
                dependency, step, ..
            })) => {
                assert_eq!(dependency, "libiconv");
                assert_eq!(step, BuildStep::Configure);
            }
            other => panic!("expected step failure, got {other:?}"),
        }

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 7);
        assert!(!invocations
            .iter()
            .any(|inv| working_dir(inv).starts_with("libxml2")));
    }

    #[tokio::test]
    async fn test_unspawnable_tool_is_step_failure() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = native_env(temp.path());
        env.layout().create_dirs().await.unwrap();
        seed_source_dirs(&env.layout().scratch_dir);

        let runner = Arc::new(RecordingRunner::new().without_program("make"));
        let result = Pipeline::new(runner).run(&mut env).await;
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::StepFailed {
                step: BuildStep::Build,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_missing_source_dir() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = native_env(temp.path());
        env.layout().create_dirs().await.unwrap();

        let runner = Arc::new(RecordingRunner::new());
        let result = Pipeline::new(runner.clone()).run(&mut env).await;
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::SourceDirMissing { .. }))
        ));
        assert!(runner.invocations().is_empty());
    }

    #[test]
    fn test_plan_matches_run_order() {
        let temp = tempfile::tempdir().unwrap();
        let env = native_env(temp.path());
        let plan = Pipeline::plan(&env);
        let kinds: Vec<DependencyKind> = plan.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, DependencyKind::BUILD_ORDER);
        assert!(plan.iter().all(|p| p.steps.len() == 3));
    }

    #[tokio::test]
    async fn test_ensure_source_is_idempotent() {
        let server = MockServer::start();
        let body = gzip(&tarball("zlib-1.3.1", b"z")).await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/zlib/zlib-1.3.1.tar.gz");
            then.status(200).body(&body);
        });

        let temp = tempfile::tempdir().unwrap();
        let cache = ArchiveCache::new(
            temp.path().join("cache"),
            NetClient::with_defaults().unwrap(),
            Endpoints::with_base(&server.base_url()),
        );
        let spec = DependencySpec::new(DependencyKind::Zlib, Some("1.3.1".to_string()));

        let first = cache.ensure_source(&spec).await.unwrap();
        let second = cache.ensure_source(&spec).await.unwrap();

        mock.assert_hits(1);
        assert!(first.downloaded);
        assert!(!second.downloaded);
        assert_eq!(first.archive, second.archive);
        assert_eq!(first.archive, temp.path().join("cache/zlib.tar.gz"));
    }

    #[tokio::test]
    async fn test_failed_download_leaves_cache_clean() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/zlib/zlib-9.9.tar.gz");
            then.status(404);
        });

        let temp = tempfile::tempdir().unwrap();
        let cache = ArchiveCache::new(
            temp.path(),
            NetClient::with_defaults().unwrap(),
            Endpoints::with_base(&server.base_url()),
        );
        let spec = DependencySpec::new(DependencyKind::Zlib, Some("9.9".to_string()));

        let result = cache.ensure_source(&spec).await;
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::FetchFailed { .. }))
        ));
        assert!(cache.find_cached("zlib*").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_full_source_build_scenario() {
        let server = MockServer::start();
        let base = server.base_url();
        let (tx, mut rx) = channel();

        let archives = [
            (
                "/api/repos/openssl/openssl/tarball/openssl-3.6.0",
                gzip(&tarball("openssl-openssl-3.6.0", b"o")).await,
            ),
            ("/zlib/zlib-1.3.1.tar.gz", gzip(&tarball("zlib-1.3.1", b"z")).await),
            ("/libiconv/libiconv-1.18.tar.gz", gzip(&tarball("libiconv-1.18", b"i")).await),
            (
                "/gnome/libxml2/2.14/libxml2-2.14.6.tar.xz",
                xz(&tarball("libxml2-2.14.6", b"x")).await,
            ),
            (
                "/gnome/libxslt/1.1/libxslt-1.1.43.tar.xz",
                xz(&tarball("libxslt-1.1.43", b"s")).await,
            ),
            ("/web/xmlsec1-1.3.9.tar.gz", gzip(&tarball("xmlsec1-1.3.9", b"m")).await),
        ];
        let downloads: Vec<_> = archives
            .iter()
            .map(|(path, body)| {
                server.mock(|when, then| {
                    when.method(GET).path(*path);
                    then.status(200).body(body);
                })
            })
            .collect();

        server.mock(|when, then| {
            when.method(GET).path("/libiconv");
            then.status(200)
                .body(r#"<a href="libiconv-1.17.tar.gz">old</a><a href="libiconv-1.18.tar.gz">new</a>"#);
        });
        for (lib, version, rel) in [
            ("libxml2", "2.14.6", "2.14/libxml2-2.14.6.tar.xz"),
            ("libxslt", "1.1.43", "1.1/libxslt-1.1.43.tar.xz"),
        ] {
            server.mock(move |when, then| {
                when.method(GET).path(format!("/gnome/{lib}/cache.json"));
                then.status(200).json_body(json!([
                    4,
                    { lib: { version: { "tar.xz": rel } } },
                    { lib: [version] },
                    []
                ]));
            });
        }
        server.mock(|when, then| {
            when.method(GET).path("/api/repos/lsh123/xmlsec/releases/latest");
            then.status(200).json_body(json!({
                "assets": [{
                    "name": "xmlsec1-1.3.9.tar.gz",
                    "browser_download_url": format!("{base}/web/xmlsec1-1.3.9.tar.gz")
                }]
            }));
        });

        let temp = tempfile::tempdir().unwrap();
        let mut env = native_env(temp.path());
        env.layout().create_dirs().await.unwrap();

        let cache = ArchiveCache::new(
            env.layout().cache_dir.clone(),
            NetClient::with_defaults().unwrap(),
            Endpoints::with_base(&base),
        )
        .with_event_sender(tx.clone());
        let mut pins = BTreeMap::new();
        pins.insert(DependencyKind::Zlib, "1.3.1".to_string());
        pins.insert(DependencyKind::OpenSsl, "3.6.0".to_string());
        let specs = DependencySpec::all_in_build_order(&pins);

        let runner = Arc::new(RecordingRunner::new());
        let summary = Pipeline::new(runner.clone())
            .with_event_sender(tx)
            .build_from_sources(&cache, &specs, &mut env)
            .await
            .unwrap();

        for mock in &downloads {
            mock.assert_hits(1);
        }
        assert_eq!(summary.built.len(), 6);
        assert_eq!(runner.invocations().len(), 18);
        assert_eq!(working_dir(&runner.invocations()[0]), "openssl-openssl-3.6.0");

        let mut extracted = 0;
        let mut downloaded: Vec<PathBuf> = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Acquisition(AcquisitionEvent::ExtractCompleted { .. }) => extracted += 1,
                AppEvent::Acquisition(AcquisitionEvent::DownloadCompleted { path, .. }) => {
                    downloaded.push(path);
                }
                _ => {}
            }
        }
        assert_eq!(extracted, 6);
        assert_eq!(downloaded.len(), 6);
    }
}
