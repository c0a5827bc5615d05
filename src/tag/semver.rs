use std::cmp::Ordering;

use semver::Version;

/// Parse a registry tag into a semver::Version.
///
/// A single leading 'v' is stripped before parsing. Everything else must be a
/// strict `MAJOR.MINOR.PATCH[-pre][+build]`, so partial versions ("1.2") and
/// labels like "latest" yield None.
///
/// Examples:
/// - "v1.2.3" -> Version(1, 2, 3)
/// - "1.41.0-amd64" -> Version(1, 41, 0, pre = "amd64")
/// - "latest" -> None
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    let stripped = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(stripped).ok()
}

/// Compare two versions by semver precedence, ignoring build metadata.
///
/// `Ord` on `semver::Version` breaks ties on build metadata, which precedence
/// rules say must not affect ordering.
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// Drop prerelease and build parts, keeping only `major.minor.patch`
pub fn release_core(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", Some("1.2.3"))]
    #[case("v1.2.3", Some("1.2.3"))]
    #[case("v1.41.0-amd64", Some("1.41.0-amd64"))]
    #[case("1.0.0-rc.1+build.5", Some("1.0.0-rc.1+build.5"))]
    #[case("vv1.2.3", None)] // only one prefix is stripped
    #[case("1.2", None)] // partial versions are not accepted
    #[case("v1.2.3.0", None)]
    #[case("latest", None)]
    #[case("edge", None)]
    #[case("", None)]
    fn parse_tag_version_returns_expected(#[case] tag: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            parse_tag_version(tag).map(|v| v.to_string()),
            expected.map(|s| s.to_string())
        );
    }

    #[rstest]
    #[case("1.2.3", "1.2.3+build.1", Ordering::Equal)]
    #[case("1.2.3-alpha", "1.2.3", Ordering::Less)]
    #[case("1.2.3-alpha.2", "1.2.3-alpha.10", Ordering::Less)] // numeric identifiers
    #[case("1.2.3-amd64", "1.2.3-arm64", Ordering::Less)]
    #[case("2.0.0", "1.99.99", Ordering::Greater)]
    fn cmp_precedence_follows_semver_rules(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        let a = Version::parse(a).unwrap();
        let b = Version::parse(b).unwrap();
        assert_eq!(cmp_precedence(&a, &b), expected);
    }

    #[test]
    fn release_core_strips_prerelease_and_build() {
        let version = Version::parse("1.41.0-arm64+meta").unwrap();
        assert_eq!(release_core(&version), Version::new(1, 41, 0));
    }
}
