//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde::Deserialize;
    use tempfile::tempdir;
    use xsdeps_errors::{Error, NetworkError};
    use xsdeps_events::channel;
    use xsdeps_net::*;

    #[derive(Debug, Deserialize)]
    struct Release {
        tarball_url: String,
    }

    fn client_with_token(token: Option<&str>) -> NetClient {
        NetClient::new(NetConfig {
            bearer_token: token.map(str::to_string),
            ..NetConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_download_file() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let content = b"test archive content";
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zlib-1.3.1.tar.gz")
                .header("user-agent", "xsdeps build");
            then.status(200)
                .header("content-length", content.len().to_string())
                .body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("zlib.tar.gz");
        let client = NetClient::with_defaults().unwrap();

        let bytes = download_file(&client, &server.url("/zlib-1.3.1.tar.gz"), &dest, &tx)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(bytes, content.len() as u64);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), content);
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing_behind() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/missing.tar.gz");
            then.status(404);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("missing.tar.gz");
        let client = NetClient::with_defaults().unwrap();

        let result = download_file(&client, &server.url("/missing.tar.gz"), &dest, &tx).await;

        assert!(matches!(
            result,
            Err(Error::Network(NetworkError::HttpError { status: 404, .. }))
        ));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_fetch_text_uses_metadata_agent() {
        let server = MockServer::start();
        let (tx, _rx) = channel();
        let agent = NetConfig::default().user_agent;

        let mock = server.mock(|when, then| {
            when.method(GET).path("/index/").header("user-agent", agent.as_str());
            then.status(200).body("<a href=\"zlib-1.3.1.tar.gz\">");
        });

        let client = NetClient::with_defaults().unwrap();
        let body = fetch_text(&client, &server.url("/index/"), &tx).await.unwrap();

        mock.assert();
        assert!(body.contains("zlib-1.3.1"));
    }

    #[tokio::test]
    async fn test_fetch_json_sends_bearer_token() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/openssl/openssl/releases/latest")
                .header("authorization", "Bearer s3cret");
            then.status(200)
                .json_body(serde_json::json!({ "tarball_url": "https://example.test/t.tar.gz" }));
        });

        let client = client_with_token(Some("s3cret"));
        let release: Release = fetch_json(
            &client,
            &server.url("/repos/openssl/openssl/releases/latest"),
            true,
            &tx,
        )
        .await
        .unwrap();

        mock.assert();
        assert_eq!(release.tarball_url, "https://example.test/t.tar.gz");
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_bad_body() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/cache.json");
            then.status(200).body("not json");
        });

        let client = NetClient::with_defaults().unwrap();
        let result: Result<serde_json::Value, _> =
            fetch_json(&client, &server.url("/cache.json"), false, &tx).await;

        assert!(matches!(
            result,
            Err(Error::Network(NetworkError::InvalidResponse { .. }))
        ));
    }
}
