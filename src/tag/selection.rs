//! Candidate tag selection from a registry listing

use std::collections::BTreeSet;

use indexmap::IndexMap;
use semver::Version;
use tracing::debug;

use crate::config::{DEFAULT_FLOOR_COUNT, DEFAULT_TAG_PREFIX};
use crate::tag::classifier::{ArchMarkers, Architecture, is_stable};
use crate::tag::error::SelectionError;
use crate::tag::semver::{cmp_precedence, parse_tag_version, release_core};
use crate::tag::types::{SelectionResult, TagSet};

/// Lower bound applied to candidate versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionWindow {
    /// No lower bound
    All,
    /// Fixed baseline; tags below it are dropped
    MinVersion(Version),
    /// Keep the N most recent `major.minor.patch` lines
    FloorCount(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Literal prefix a candidate tag must start with
    pub require_prefix: Option<String>,
    pub window: VersionWindow,
    pub markers: ArchMarkers,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            require_prefix: Some(DEFAULT_TAG_PREFIX.to_string()),
            window: VersionWindow::FloorCount(DEFAULT_FLOOR_COUNT),
            markers: ArchMarkers::default(),
        }
    }
}

/// Compute the minimum version that keeps the `floor_count` most recent
/// release lines.
///
/// Every parseable tag counts, including prefix-less and unstable ones.
/// Versions are collapsed to `major.minor.patch` before counting. With fewer
/// than `floor_count` distinct lines the lowest one is returned.
pub fn version_floor(tags: &[String], floor_count: usize) -> Result<Version, SelectionError> {
    let lines: BTreeSet<Version> = tags
        .iter()
        .filter_map(|tag| parse_tag_version(tag))
        .map(|version| release_core(&version))
        .collect();

    let floor = lines
        .iter()
        .rev()
        .nth(floor_count.saturating_sub(1))
        .or_else(|| lines.first())
        .cloned();

    floor.ok_or(SelectionError::NoVersionsFound {
        tag_count: tags.len(),
    })
}

fn resolve_threshold(
    tags: &[String],
    window: &VersionWindow,
) -> Result<Option<Version>, SelectionError> {
    match window {
        VersionWindow::All => Ok(None),
        VersionWindow::MinVersion(min) => Ok(Some(min.clone())),
        VersionWindow::FloorCount(count) => version_floor(tags, *count).map(Some),
    }
}

/// Filter the listing down to prefixed, stable, parseable tags at or above the
/// version window, ordered from newest to oldest.
///
/// Duplicate tags keep their first occurrence, and tags with equal precedence
/// keep their source order.
pub fn eligible_tags(
    tags: &[String],
    options: &SelectionOptions,
) -> Result<Vec<(String, Version)>, SelectionError> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let threshold = resolve_threshold(tags, &options.window)?;
    if let Some(threshold) = &threshold {
        debug!("Version floor: {}", threshold);
    }

    let has_prefix = |tag: &str| {
        options
            .require_prefix
            .as_deref()
            .is_none_or(|prefix| tag.starts_with(prefix))
    };
    let in_window = |version: &Version| {
        threshold
            .as_ref()
            .is_none_or(|floor| cmp_precedence(version, floor).is_ge())
    };

    let mut unique: IndexMap<&str, Version> = IndexMap::new();
    for tag in tags.iter().filter(|tag| has_prefix(tag.as_str()) && is_stable(tag)) {
        if let Some(version) = parse_tag_version(tag).filter(|version| in_window(version)) {
            unique.entry(tag.as_str()).or_insert(version);
        }
    }

    let mut ordered: Vec<(String, Version)> = unique
        .into_iter()
        .map(|(tag, version)| (tag.to_string(), version))
        .collect();
    ordered.sort_by(|(_, a), (_, b)| cmp_precedence(b, a));

    Ok(ordered)
}

/// Select the unsplit tag list used by the plain `tags` output
pub fn select_tags(tags: &[String], options: &SelectionOptions) -> Result<TagSet, SelectionError> {
    Ok(eligible_tags(tags, options)?
        .into_iter()
        .map(|(tag, _)| tag)
        .collect())
}

/// Split eligible tags into arm64, amd64 and multi-arch candidates.
///
/// A tag is a multi candidate when it has no architecture marker and both its
/// `-<arm64>` and `-<amd64>` variants are arm64/amd64 candidates of this run.
pub fn select(
    tags: &[String],
    options: &SelectionOptions,
) -> Result<SelectionResult, SelectionError> {
    let eligible = eligible_tags(tags, options)?;
    let markers = &options.markers;

    let by_arch = |arch: Architecture| -> TagSet {
        eligible
            .iter()
            .filter(|(tag, _)| markers.architecture_of(tag) == arch)
            .map(|(tag, _)| tag.clone())
            .collect()
    };

    let arm64 = by_arch(Architecture::Arm64);
    let amd64 = by_arch(Architecture::Amd64);
    let multi = by_arch(Architecture::None)
        .into_iter()
        .filter(|tag| {
            arm64.contains(&markers.arm64_variant(tag))
                && amd64.contains(&markers.amd64_variant(tag))
        })
        .collect();

    Ok(SelectionResult { arm64, amd64, multi })
}
