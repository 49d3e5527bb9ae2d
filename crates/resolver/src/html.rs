//! Directory index listings

use regex::Regex;
use xsdeps_errors::ResolveError;
use xsdeps_types::DottedVersion;

const ANCHOR_HREF: &str = r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#;

/// Every `<a href>` target in document order
///
/// # Errors
///
/// Returns `ResolveError::InvalidPattern` if the anchor pattern fails to compile.
pub fn collect_hrefs(document: &str) -> Result<Vec<String>, ResolveError> {
    let anchor = Regex::new(ANCHOR_HREF).map_err(|e| ResolveError::InvalidPattern {
        pattern: ANCHOR_HREF.to_string(),
        message: e.to_string(),
    })?;

    Ok(anchor
        .captures_iter(document)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Compile a version pattern; it must define a `version` group
///
/// # Errors
///
/// Returns `ResolveError::InvalidPattern` if the pattern does not compile or
/// has no `version` group.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ResolveError> {
    let regex = Regex::new(pattern).map_err(|e| ResolveError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    if !regex.capture_names().flatten().any(|name| name == "version") {
        return Err(ResolveError::InvalidPattern {
            pattern: pattern.to_string(),
            message: "missing `version` capture group".to_string(),
        });
    }
    Ok(regex)
}

/// Sort key of a link: its parsed version token, `None` when it has none
///
/// `None` orders below every parsed version, `0.0` included.
#[must_use]
pub fn href_version(pattern: &Regex, href: &str) -> Option<DottedVersion> {
    pattern
        .captures(href)
        .and_then(|caps| caps.name("version"))
        .and_then(|m| DottedVersion::parse(m.as_str()))
}

/// The link with the greatest version; the first one wins a tie
#[must_use]
pub fn select_latest<'a>(pattern: &Regex, hrefs: &'a [String]) -> Option<&'a str> {
    let mut best: Option<(&str, Option<DottedVersion>)> = None;
    for href in hrefs {
        let version = href_version(pattern, href);
        match &best {
            Some((_, current)) if *current >= version => {}
            _ => best = Some((href.as_str(), version)),
        }
    }
    best.map(|(href, _)| href)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zlib() -> Regex {
        compile_pattern(r"^zlib-(?P<version>.+)\.tar\.gz$").unwrap()
    }

    #[test]
    fn test_collect_hrefs() {
        let page = r#"<html><a href="../">up</a> <A HREF='zlib-1.2.tar.gz'>x</A>
            <a class="f" href=zlib-1.3.tar.gz>y</a><link href="style.css"></html>"#;
        assert_eq!(
            collect_hrefs(page).unwrap(),
            ["../", "zlib-1.2.tar.gz", "zlib-1.3.tar.gz"]
        );
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let hrefs: Vec<String> = [
            "zlib-1.2.9.tar.gz",
            "zlib-1.2.13.tar.gz",
            "zlib-1.2.11.tar.gz",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(select_latest(&zlib(), &hrefs), Some("zlib-1.2.13.tar.gz"));
    }

    #[test]
    fn test_unparseable_tokens_rank_lowest() {
        let hrefs: Vec<String> = ["../", "zlib-latest.tar.gz", "zlib-1.0.tar.gz", "README"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(select_latest(&zlib(), &hrefs), Some("zlib-1.0.tar.gz"));

        // Even a zero version beats an earlier unparseable one
        let hrefs: Vec<String> = ["zlib-devel.tar.gz", "zlib-0.0.tar.gz"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(select_latest(&zlib(), &hrefs), Some("zlib-0.0.tar.gz"));
        assert!(
            href_version(&zlib(), "zlib-devel.tar.gz") < href_version(&zlib(), "zlib-0.tar.gz")
        );
    }

    #[test]
    fn test_first_wins_tie() {
        let hrefs: Vec<String> = ["a", "b"].iter().map(ToString::to_string).collect();
        assert_eq!(select_latest(&zlib(), &hrefs), Some("a"));
        assert_eq!(select_latest(&zlib(), &[]), None);
    }

    #[test]
    fn test_pattern_needs_version_group() {
        assert!(compile_pattern("zlib-(.*)").is_err());
        assert!(compile_pattern("zlib-(?P<version>").is_err());
    }
}
