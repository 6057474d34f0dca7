//! Stub cascades and output helpers shared by the CLI tests.

use super::*;
use crate::sources::{CascadeBuilder, SourceConfig};
use camino::Utf8PathBuf;
use serde_json::Value;
use std::cell::RefCell;
use tempfile::TempDir;
use waymark_core::SearchCascade;

type Tiers = Box<dyn FnOnce(SearchCascade) -> SearchCascade>;

/// Builds one cascade from the resolved sources plus test-provided tiers.
pub(super) struct StubCascadeBuilder {
    tiers: RefCell<Option<Tiers>>,
    seen: RefCell<Option<SourceConfig>>,
}

impl StubCascadeBuilder {
    pub(super) fn new(tiers: impl FnOnce(SearchCascade) -> SearchCascade + 'static) -> Self {
        Self {
            tiers: RefCell::new(Some(Box::new(tiers))),
            seen: RefCell::new(None),
        }
    }

    /// Sources passed to the most recent build.
    pub(super) fn seen(&self) -> SourceConfig {
        self.seen.borrow().clone().expect("cascade was built")
    }
}

impl CascadeBuilder for StubCascadeBuilder {
    fn build(&self, sources: &SourceConfig) -> Result<SearchCascade, CliError> {
        self.seen.replace(Some(sources.clone()));
        let cascade = SearchCascade::new(sources.cascade.clone());
        Ok(match self.tiers.take() {
            Some(tiers) => tiers(cascade),
            None => cascade,
        })
    }
}

/// Parse captured stdout as JSON.
pub(super) fn stdout_json(stdout: &[u8]) -> Value {
    let text = std::str::from_utf8(stdout).expect("stdout utf-8");
    assert!(text.ends_with('\n'), "output should end with a newline");
    serde_json::from_str(text).expect("output should be JSON")
}

/// Temporary UTF-8 directory removed on drop.
pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, path)
}
