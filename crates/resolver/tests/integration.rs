//! Integration tests for resolver crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use proptest::prelude::*;
    use serde_json::json;
    use xsdeps_errors::{Error, ResolveError};
    use xsdeps_events::{channel, AcquisitionEvent, AppEvent};
    use xsdeps_net::{NetClient, NetConfig};
    use xsdeps_resolver::*;
    use xsdeps_types::{DependencyKind, Endpoints};

    fn resolver(token: Option<&str>) -> ReleaseResolver {
        let client = NetClient::new(NetConfig {
            bearer_token: token.map(str::to_string),
            ..NetConfig::default()
        })
        .unwrap();
        ReleaseResolver::new(client)
    }

    #[tokio::test]
    async fn test_html_index_picks_numeric_max() {
        let server = MockServer::start();
        let (tx, _rx) = channel();
        let endpoints = Endpoints::with_base(&server.base_url());

        server.mock(|when, then| {
            when.method(GET).path("/zlib");
            then.status(200).body(
                r#"<a href="zlib-1.2.9.tar.gz">a</a>
                   <a href="zlib-1.2.13.tar.gz">b</a>
                   <a href="zlib-1.2.13.tar.gz.asc">c</a>
                   <a href="../">parent</a>"#,
            );
        });

        let kind = DependencyKind::Zlib;
        let url = resolver(None)
            .latest_url(kind, &kind.release_channel(&endpoints), &tx)
            .await
            .unwrap();

        assert_eq!(url, format!("{}/zlib/zlib-1.2.13.tar.gz", server.base_url()));
    }

    #[tokio::test]
    async fn test_html_index_without_links_fails() {
        let server = MockServer::start();
        let (tx, _rx) = channel();
        let endpoints = Endpoints::with_base(&server.base_url());

        server.mock(|when, then| {
            when.method(GET).path("/libiconv");
            then.status(200).body("<html><body>nothing here</body></html>");
        });

        let kind = DependencyKind::Libiconv;
        let result = resolver(None)
            .latest_url(kind, &kind.release_channel(&endpoints), &tx)
            .await;

        assert!(matches!(
            result,
            Err(Error::Resolve(ResolveError::EmptyIndex { .. }))
        ));
    }

    #[tokio::test]
    async fn test_json_manifest() {
        let server = MockServer::start();
        let (tx, _rx) = channel();
        let endpoints = Endpoints::with_base(&server.base_url());

        let mock = server.mock(|when, then| {
            when.method(GET).path("/gnome/libxslt/cache.json");
            then.status(200).json_body(json!([
                4,
                {"libxslt": {"1.1.43": {"tar.xz": "1.1/libxslt-1.1.43.tar.xz"}}},
                {"libxslt": ["1.1.42", "1.1.43"]},
                []
            ]));
        });

        let kind = DependencyKind::Libxslt;
        let url = resolver(None)
            .latest_url(kind, &kind.release_channel(&endpoints), &tx)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(
            url,
            format!("{}/gnome/libxslt/1.1/libxslt-1.1.43.tar.xz", server.base_url())
        );
    }

    #[tokio::test]
    async fn test_release_api_with_token() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();
        let endpoints = Endpoints::with_base(&server.base_url());

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/repos/lsh123/xmlsec/releases/latest")
                .header("authorization", "Bearer tkn");
            then.status(200).json_body(json!({
                "tarball_url": "https://api.test/tarball",
                "assets": [
                    {"name": "xmlsec1-1.3.9.tar.gz", "browser_download_url": "https://dl.test/xmlsec1-1.3.9.tar.gz"},
                    {"name": "xmlsec1-1.3.9.tar.gz.sig", "browser_download_url": "https://dl.test/sig"}
                ]
            }));
        });

        let kind = DependencyKind::Xmlsec1;
        let url = resolver(Some("tkn"))
            .latest_url(kind, &kind.release_channel(&endpoints), &tx)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(url, "https://dl.test/xmlsec1-1.3.9.tar.gz");

        let mut saw_auth = false;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Acquisition(AcquisitionEvent::AuthenticatedRequest { .. }) = event {
                saw_auth = true;
            }
        }
        assert!(saw_auth);
    }

    #[tokio::test]
    async fn test_network_failure_names_dependency() {
        let server = MockServer::start();
        let (tx, _rx) = channel();
        let endpoints = Endpoints::with_base(&server.base_url());

        server.mock(|when, then| {
            when.method(GET).path("/api/repos/openssl/openssl/releases/latest");
            then.status(403);
        });

        let kind = DependencyKind::OpenSsl;
        let result = resolver(None)
            .latest_url(kind, &kind.release_channel(&endpoints), &tx)
            .await;

        match result {
            Err(Error::Resolve(ResolveError::LatestUnavailable { dependency, .. })) => {
                assert_eq!(dependency, "OpenSSL");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_numeric_greatest_wins(
            versions in prop::collection::vec(
                prop::collection::vec(prop_oneof![Just(0u64), 0u64..50], 1..4),
                1..8,
            ),
            junk_at in prop::collection::vec(any::<prop::sample::Index>(), 2),
        ) {
            let pattern = compile_pattern(r"^zlib-(?P<version>.+)\.tar\.gz$").unwrap();
            let mut hrefs: Vec<String> = versions
                .iter()
                .map(|parts| {
                    let joined = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
                    format!("zlib-{joined}.tar.gz")
                })
                .collect();
            for (junk, at) in ["zlib-devel.tar.gz", "../"].into_iter().zip(&junk_at) {
                let position = at.index(hrefs.len() + 1);
                hrefs.insert(position, junk.to_string());
            }

            let chosen = select_latest(&pattern, &hrefs).unwrap();
            let chosen_version = href_version(&pattern, chosen);
            for href in &hrefs {
                prop_assert!(href_version(&pattern, href) <= chosen_version);
            }
            prop_assert!(chosen != "zlib-devel.tar.gz" && chosen != "../");
        }
    }
}
