//! One invocation: fetch, select, diff, then write output and state

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{BaselineConfig, Config};
use crate::output::{OutputSink, render};
use crate::tag::diff::{DownstreamListing, diff_emission};
use crate::tag::error::{RegistryError, SelectionError, StateError};
use crate::tag::registries::{GitHubPackagesRegistry, McrRegistry};
use crate::tag::registry::{PublishedTags, TagSource};
use crate::tag::selection::{SelectionOptions, select, select_tags};
use crate::tag::state::{PriorState, StateStore};
use crate::tag::types::{Category, Emission};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Registry request failed: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Failed to write state file: {0}")]
    State(#[from] StateError),

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Failed to append to {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// `arm64=`, `amd64=` and `multi=` lines
    #[default]
    Matrix,
    /// A single `tags=` line without architecture split
    Plain,
}

/// Where already-processed tags come from
pub enum BaselineSource {
    None,
    State(StateStore),
    Downstream {
        registry: Box<dyn PublishedTags>,
        org: String,
        package: String,
    },
}

/// Everything computed for a run, before anything is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Selection before the baseline is subtracted
    pub selected: Emission,
    /// Selection after the baseline is subtracted
    pub emitted: Emission,
    /// State to persist, when the baseline is a state file
    pub next_state: Option<PriorState>,
}

/// Tag counts of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub selected: usize,
    pub emitted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub counts: Vec<CategoryCount>,
}

impl RunOutcome {
    pub fn report(&self) -> RunReport {
        let counts = self
            .selected
            .entries()
            .into_iter()
            .zip(self.emitted.entries())
            .map(|((category, selected), (_, emitted))| CategoryCount {
                category,
                selected: selected.len(),
                emitted: emitted.len(),
            })
            .collect();
        RunReport { counts }
    }
}

pub struct Pipeline {
    source: Box<dyn TagSource>,
    baseline: BaselineSource,
    image_name: String,
    options: SelectionOptions,
    sink: OutputSink,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn TagSource>,
        baseline: BaselineSource,
        image_name: impl Into<String>,
        options: SelectionOptions,
        sink: OutputSink,
    ) -> Self {
        Self {
            source,
            baseline,
            image_name: image_name.into(),
            options,
            sink,
        }
    }

    /// Wire the MCR source and the configured baseline
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let source = McrRegistry::new(&config.source_registry_url)?;
        let baseline = match &config.baseline {
            BaselineConfig::None => BaselineSource::None,
            BaselineConfig::StateFile(path) => BaselineSource::State(StateStore::new(path)),
            BaselineConfig::Downstream {
                org,
                package,
                token,
            } => BaselineSource::Downstream {
                registry: Box::new(GitHubPackagesRegistry::new(
                    &config.downstream_api_url,
                    token.clone(),
                )?),
                org: org.clone(),
                package: package.clone(),
            },
        };

        Ok(Self::new(
            Box::new(source),
            baseline,
            config.image_name.clone(),
            config.selection.clone(),
            OutputSink::new(&config.output_path),
        ))
    }

    /// Fetch and compute without touching the output or state files
    pub async fn compute(&self, mode: Mode) -> Result<RunOutcome, PipelineError> {
        let tags = self.source.fetch_tags(&self.image_name).await?;
        info!("Fetched {} tags for {}", tags.len(), self.image_name);

        let selected = match mode {
            Mode::Matrix => Emission::Matrix(select(&tags, &self.options)?),
            Mode::Plain => Emission::Plain(select_tags(&tags, &self.options)?),
        };

        let (emitted, next_state) = match &self.baseline {
            BaselineSource::None => (selected.clone(), None),
            BaselineSource::State(store) => {
                let prior = store.load();
                let emitted = diff_emission(&selected, &prior);
                let mut next = prior;
                next.record(&selected);
                (emitted, Some(next))
            }
            BaselineSource::Downstream {
                registry,
                org,
                package,
            } => {
                let listing = DownstreamListing::new(registry.fetch_published(org, package).await?);
                info!("Found {} published names for {}/{}", listing.len(), org, package);
                (diff_emission(&selected, &listing), None)
            }
        };

        Ok(RunOutcome {
            selected,
            emitted,
            next_state,
        })
    }

    /// Compute, then append the output lines and persist the merged state.
    ///
    /// Nothing is written unless every fetch and computation succeeded. The
    /// state is staged before the output is appended, so a state file that
    /// cannot be written leaves the output untouched.
    pub async fn run(&self, mode: Mode) -> Result<RunReport, PipelineError> {
        let outcome = self.compute(mode).await?;

        for (category, tags) in outcome.emitted.entries() {
            info!("{}: {} to build", category, tags.len());
            debug!("{}: {:?}", category, tags);
        }

        let rendered = render(&outcome.emitted)?;
        let staged = match (&self.baseline, &outcome.next_state) {
            (BaselineSource::State(store), Some(state)) => Some((store, store.stage(state)?)),
            _ => None,
        };

        self.sink
            .append(&rendered)
            .map_err(|source| PipelineError::Output {
                path: self.sink.path().to_path_buf(),
                source,
            })?;

        if let Some((store, staged)) = staged {
            staged.commit()?;
            debug!("Saved state to {:?}", store.path());
        }

        Ok(outcome.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::registry::{MockPublishedTags, MockTagSource};
    use crate::tag::types::{SelectionResult, TagSet};
    use tempfile::TempDir;

    const SCENARIO_TAGS: [&str; 4] = [
        "v1.41.0-amd64",
        "v1.41.0-arm64",
        "v1.41.0",
        "v1.40.0-alpha-amd64",
    ];

    fn set(tags: &[&str]) -> TagSet {
        tags.iter().map(|s| s.to_string()).collect()
    }

    fn source_with(tags: &'static [&'static str]) -> Box<MockTagSource> {
        let mut source = MockTagSource::new();
        source
            .expect_fetch_tags()
            .withf(|image_name| image_name == "dotnet/runtime")
            .times(1)
            .returning(move |_| Ok(tags.iter().map(|s| s.to_string()).collect()));
        Box::new(source)
    }

    fn pipeline(
        source: Box<MockTagSource>,
        baseline: BaselineSource,
        output: &TempDir,
    ) -> Pipeline {
        Pipeline::new(
            source,
            baseline,
            "dotnet/runtime",
            SelectionOptions::default(),
            OutputSink::new(output.path().join("github_output")),
        )
    }

    fn read_output(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("github_output")).unwrap_or_default()
    }

    #[tokio::test]
    async fn run_without_baseline_emits_full_selection() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(source_with(&SCENARIO_TAGS), BaselineSource::None, &dir);

        let report = pipeline.run(Mode::Matrix).await.unwrap();

        assert_eq!(
            read_output(&dir),
            "arm64=[\"v1.41.0-arm64\"]\namd64=[\"v1.41.0-amd64\"]\nmulti=[\"v1.41.0\"]\n"
        );
        assert!(report.counts.iter().all(|c| c.selected == 1 && c.emitted == 1));
    }

    #[tokio::test]
    async fn run_skips_tags_recorded_in_state_and_merges_state() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        std::fs::write(&state_path, r#"{"amd64": ["v1.41.0-amd64", "v1.0.0-amd64"]}"#).unwrap();
        let pipeline = pipeline(
            source_with(&SCENARIO_TAGS),
            BaselineSource::State(StateStore::new(&state_path)),
            &dir,
        );

        pipeline.run(Mode::Matrix).await.unwrap();

        assert_eq!(
            read_output(&dir),
            "arm64=[\"v1.41.0-arm64\"]\namd64=[]\nmulti=[\"v1.41.0\"]\n"
        );
        let saved = StateStore::new(&state_path).read().unwrap();
        assert!(saved.amd64.contains("v1.0.0-amd64"));
        assert!(saved.amd64.contains("v1.41.0-amd64"));
        assert!(saved.arm64.contains("v1.41.0-arm64"));
        assert!(saved.multi.contains("v1.41.0"));
    }

    #[tokio::test]
    async fn compute_against_downstream_listing_does_not_persist_state() {
        let dir = TempDir::new().unwrap();
        let mut registry = MockPublishedTags::new();
        registry
            .expect_fetch_published()
            .withf(|org, package| org == "acme" && package == "runtime")
            .times(1)
            .returning(|_, _| Ok(vec!["v1.41.0".to_string(), "sha256:abc".to_string()]));
        let pipeline = pipeline(
            source_with(&SCENARIO_TAGS),
            BaselineSource::Downstream {
                registry: Box::new(registry),
                org: "acme".to_string(),
                package: "runtime".to_string(),
            },
            &dir,
        );

        let outcome = pipeline.compute(Mode::Matrix).await.unwrap();

        assert_eq!(
            outcome.emitted,
            Emission::Matrix(SelectionResult {
                arm64: set(&["v1.41.0-arm64"]),
                amd64: set(&["v1.41.0-amd64"]),
                multi: TagSet::new(),
            })
        );
        assert_eq!(outcome.next_state, None);
        assert_eq!(read_output(&dir), "");
    }

    #[tokio::test]
    async fn run_in_plain_mode_emits_tags_line() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(
            source_with(&["v2.0.0", "v1.0.0", "latest", "v2.1.0-beta"]),
            BaselineSource::None,
            &dir,
        );

        pipeline.run(Mode::Plain).await.unwrap();

        assert_eq!(read_output(&dir), "tags=[\"v2.0.0\",\"v1.0.0\"]\n");
    }

    #[tokio::test]
    async fn run_writes_nothing_when_source_fails() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        let mut source = MockTagSource::new();
        source.expect_fetch_tags().times(1).returning(|_| {
            Err(RegistryError::MalformedResponse {
                url: "https://mcr.microsoft.com".to_string(),
                reason: "missing field `tags`".to_string(),
            })
        });
        let pipeline = pipeline(
            Box::new(source),
            BaselineSource::State(StateStore::new(&state_path)),
            &dir,
        );

        let result = pipeline.run(Mode::Matrix).await;

        assert!(matches!(result, Err(PipelineError::Registry(_))));
        assert!(!dir.path().join("github_output").exists());
        assert!(!state_path.exists());
    }

    #[tokio::test]
    async fn run_leaves_output_untouched_when_state_cannot_be_written() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("github_output"), "existing=1\n").unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let pipeline = pipeline(
            source_with(&SCENARIO_TAGS),
            BaselineSource::State(StateStore::new(blocker.join("state.json"))),
            &dir,
        );

        let result = pipeline.run(Mode::Matrix).await;

        assert!(matches!(result, Err(PipelineError::State(_))));
        assert_eq!(read_output(&dir), "existing=1\n");
    }

    #[tokio::test]
    async fn run_fails_without_versions_and_skips_downstream_fetch() {
        let dir = TempDir::new().unwrap();
        let mut registry = MockPublishedTags::new();
        registry.expect_fetch_published().never();
        let pipeline = pipeline(
            source_with(&["latest", "edge"]),
            BaselineSource::Downstream {
                registry: Box::new(registry),
                org: "acme".to_string(),
                package: "runtime".to_string(),
            },
            &dir,
        );

        let result = pipeline.run(Mode::Matrix).await;

        assert!(matches!(
            result,
            Err(PipelineError::Selection(SelectionError::NoVersionsFound { .. }))
        ));
        assert_eq!(read_output(&dir), "");
    }

    #[tokio::test]
    async fn run_twice_with_state_emits_nothing_new() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");

        for _ in 0..2 {
            let pipeline = pipeline(
                source_with(&SCENARIO_TAGS),
                BaselineSource::State(StateStore::new(&state_path)),
                &dir,
            );
            pipeline.run(Mode::Matrix).await.unwrap();
        }

        assert_eq!(
            read_output(&dir),
            concat!(
                "arm64=[\"v1.41.0-arm64\"]\namd64=[\"v1.41.0-amd64\"]\nmulti=[\"v1.41.0\"]\n",
                "arm64=[]\namd64=[]\nmulti=[]\n",
            )
        );
    }
}
