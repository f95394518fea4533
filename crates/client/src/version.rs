//! Service version parsing and capability resolution.
//!
//! Capabilities are resolved once per client instance and threaded
//! through calls; nothing here is process-global.

use std::fmt;

/// A dotted service version, e.g. `2.6.0` or `2.5.x-SNAPSHOT`.
///
/// Tokens compare numerically; a non-numeric token is treated as newer
/// than any number, so development builds pass threshold checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceVersion {
    raw: String,
}

impl ServiceVersion {
    /// Oldest service version this client will talk to.
    pub fn min_supported() -> Self {
        Self::new("2.2.3")
    }

    /// First version with checksum-only deploy.
    pub fn min_checksum_deploy() -> Self {
        Self::new("2.5.1")
    }

    /// First version deriving artifact checksums from upload headers;
    /// older servers need explicit `.sha1`/`.md5` side-files.
    pub fn min_header_checksums() -> Self {
        Self::new("2.3.2")
    }

    /// First version tolerating non-numeric build numbers.
    pub fn min_flexible_build_number() -> Self {
        Self::new("2.2.4")
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.raw.split('.')
    }

    /// True when this version is the same as or newer than `other`.
    pub fn is_at_least(&self, other: &ServiceVersion) -> bool {
        let mine: Vec<&str> = self.tokens().collect();
        let theirs: Vec<&str> = other.tokens().collect();

        for i in 0..mine.len().max(theirs.len()) {
            let mine = mine.get(i).copied().unwrap_or("0");
            let theirs = theirs.get(i).copied().unwrap_or("0");
            if mine == theirs {
                continue;
            }
            return match (mine.parse::<u64>(), theirs.parse::<u64>()) {
                (Ok(a), Ok(b)) => a > b,
                // Non-numeric token on our side: a dev/snapshot build,
                // assumed newer.
                (Err(_), _) => true,
                (_, Err(_)) => false,
            };
        }
        true
    }
}

impl fmt::Display for ServiceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What the connected service supports, resolved once per client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCapabilities {
    pub version: ServiceVersion,
}

impl ServiceCapabilities {
    pub fn new(version: ServiceVersion) -> Self {
        Self { version }
    }

    pub fn is_supported(&self) -> bool {
        self.version.is_at_least(&ServiceVersion::min_supported())
    }

    pub fn supports_checksum_deploy(&self) -> bool {
        self.version
            .is_at_least(&ServiceVersion::min_checksum_deploy())
    }

    pub fn derives_header_checksums(&self) -> bool {
        self.version
            .is_at_least(&ServiceVersion::min_header_checksums())
    }

    pub fn tolerates_flexible_build_numbers(&self) -> bool {
        self.version
            .is_at_least(&ServiceVersion::min_flexible_build_number())
    }
}
