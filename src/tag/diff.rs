//! Incremental diff of a selection against already-processed tags

use std::collections::HashSet;

use crate::tag::state::PriorState;
use crate::tag::types::{Category, Emission, SelectionResult, TagSet};

/// Record of tags that no longer need to be built
pub trait Baseline {
    /// Whether `tag` was already processed for `category`
    fn contains(&self, category: Category, tag: &str) -> bool;
}

impl Baseline for PriorState {
    fn contains(&self, category: Category, tag: &str) -> bool {
        self.tags_for(category).contains(tag)
    }
}

/// Names already published to the downstream registry.
///
/// Membership ignores the category: a published name is skipped everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownstreamListing {
    names: HashSet<String>,
}

impl DownstreamListing {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Baseline for DownstreamListing {
    fn contains(&self, _category: Category, tag: &str) -> bool {
        self.names.contains(tag)
    }
}

/// Tags of `current` not present in the baseline, in their original order.
///
/// Compares raw strings, so "v1.2.3" and "1.2.3" are different tags.
pub fn diff_tags<B: Baseline + ?Sized>(
    category: Category,
    current: &TagSet,
    baseline: &B,
) -> TagSet {
    current
        .iter()
        .filter(|tag| !baseline.contains(category, tag))
        .cloned()
        .collect()
}

pub fn diff<B: Baseline + ?Sized>(current: &SelectionResult, baseline: &B) -> SelectionResult {
    SelectionResult {
        arm64: diff_tags(Category::Arm64, &current.arm64, baseline),
        amd64: diff_tags(Category::Amd64, &current.amd64, baseline),
        multi: diff_tags(Category::Multi, &current.multi, baseline),
    }
}

/// Apply [`diff`] to either output mode
pub fn diff_emission<B: Baseline + ?Sized>(current: &Emission, baseline: &B) -> Emission {
    match current {
        Emission::Matrix(result) => Emission::Matrix(diff(result, baseline)),
        Emission::Plain(tags) => Emission::Plain(diff_tags(Category::Tags, tags, baseline)),
    }
}
