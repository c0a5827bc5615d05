//! Architecture and maturity classification of raw tags

use crate::config::{DEFAULT_AMD64_MARKER, DEFAULT_ARM64_MARKER};

/// Substrings that mark a tag as not yet stable
const UNSTABLE_MARKERS: [&str; 3] = ["-alpha", "-beta", "-next"];

/// Target architecture derived from a tag's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    Arm64,
    Amd64,
    /// No architecture marker; may be a multi-arch manifest
    None,
}

/// Substrings identifying each architecture inside a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchMarkers {
    pub arm64: String,
    pub amd64: String,
}

impl Default for ArchMarkers {
    fn default() -> Self {
        Self {
            arm64: DEFAULT_ARM64_MARKER.to_string(),
            amd64: DEFAULT_AMD64_MARKER.to_string(),
        }
    }
}

impl ArchMarkers {
    /// Label a tag by case-sensitive substring containment.
    ///
    /// Containment is intentional: "1.0-arm64-slim" is still arm64. A tag
    /// containing both markers resolves to arm64.
    pub fn architecture_of(&self, tag: &str) -> Architecture {
        if tag.contains(&self.arm64) {
            Architecture::Arm64
        } else if tag.contains(&self.amd64) {
            Architecture::Amd64
        } else {
            Architecture::None
        }
    }

    /// Tag expected for the arm64 image of a multi-arch tag
    pub fn arm64_variant(&self, tag: &str) -> String {
        format!("{}-{}", tag, self.arm64)
    }

    /// Tag expected for the amd64 image of a multi-arch tag
    pub fn amd64_variant(&self, tag: &str) -> String {
        format!("{}-{}", tag, self.amd64)
    }
}

/// Returns false for tags containing `-alpha`, `-beta` or `-next`.
///
/// This is a lexical filter, not a check of the semver prerelease field:
/// "1.2.3-rc.1" is considered stable.
pub fn is_stable(tag: &str) -> bool {
    !UNSTABLE_MARKERS.iter().any(|marker| tag.contains(marker))
}
