//! Integration tests for types

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use xsdeps_types::*;

    proptest! {
        #[test]
        fn prop_parse_display_roundtrip(parts in prop::collection::vec(0u64..10_000, 1..5)) {
            let text = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
            let version = DottedVersion::parse(&text).unwrap();
            prop_assert_eq!(version.to_string(), text);
        }

        #[test]
        fn prop_unparseable_never_beats_parseable(
            parts in prop::collection::vec(0u64..100, 2..4),
            junk in "[a-z-]{1,8}",
        ) {
            let text = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
            let good = DottedVersion::parse_or_zero(&text);
            let bad = DottedVersion::parse_or_zero(&junk);
            prop_assert!(good >= bad);
        }
    }

    #[test]
    fn test_endpoints_with_base() {
        let endpoints = Endpoints::with_base("http://127.0.0.1:8080/");
        assert_eq!(endpoints.zlib_index, "http://127.0.0.1:8080/zlib");
        assert_eq!(
            DependencyKind::Libxslt.pinned_url(&endpoints, "1.1.43"),
            "http://127.0.0.1:8080/gnome/libxslt/1.1/libxslt-1.1.43.tar.xz"
        );
    }

    #[test]
    fn test_dependency_kind_from_str() {
        assert_eq!("OpenSSL".parse::<DependencyKind>().unwrap(), DependencyKind::OpenSsl);
        assert_eq!("xmlsec".parse::<DependencyKind>().unwrap(), DependencyKind::Xmlsec1);
        assert!("libfoo".parse::<DependencyKind>().is_err());
    }
}
