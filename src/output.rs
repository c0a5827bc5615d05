//! `key=<json>` lines appended to the CI output file (e.g. `$GITHUB_OUTPUT`)

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::tag::types::Emission;

/// Render one `key=<json array>` line per category, each newline-terminated
pub fn render(emission: &Emission) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for (category, tags) in emission.entries() {
        output.push_str(category.as_str());
        output.push('=');
        output.push_str(&serde_json::to_string(tags)?);
        output.push('\n');
    }
    Ok(output)
}

/// Append-only output file
#[derive(Debug, Clone)]
pub struct OutputSink {
    path: PathBuf,
}

impl OutputSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the rendered text in a single write, creating the file if needed
    pub fn append(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(content.as_bytes())
    }
}
