//! Dotted numeric versions as published by upstream release indexes

use std::cmp::Ordering;
use std::fmt;

/// A version made of dot-separated numeric components (`1.3.1`, `2.14`)
///
/// Ordering is component-wise numeric; missing trailing components compare
/// as zero, so `1.3` and `1.3.0` are equal.
#[derive(Debug, Clone)]
pub struct DottedVersion(Vec<u64>);

impl DottedVersion {
    /// Parse a dotted numeric version, returning `None` for anything else
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        if input.is_empty() {
            return None;
        }
        input
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    part.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// The lowest version
    #[must_use]
    pub fn zero() -> Self {
        Self(vec![0, 0])
    }

    /// Parse, falling back to [`DottedVersion::zero`]
    #[must_use]
    pub fn parse_or_zero(input: &str) -> Self {
        Self::parse(input).unwrap_or_else(Self::zero)
    }

    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).copied().unwrap_or(0);
            let b = other.0.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DottedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DottedVersion {}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}
