use super::json_file::{read_json, write_json_atomic};
use crate::domain::errors::StoreError;
use crate::domain::feed::FeedDocument;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Operator-authored feed configuration file.
///
/// Whichever shape was read (bare list or `{"feeds": [...]}`) is the shape
/// written back, together with every field the agent does not interpret.
#[derive(Debug, Clone)]
pub struct FeedConfigStore {
    path: PathBuf,
}

impl FeedConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<FeedDocument>, StoreError> {
        let Some(value) = read_json(&self.path)? else {
            debug!("FeedConfigStore: no feed configuration at {:?}", self.path);
            return Ok(None);
        };

        FeedDocument::from_value(value)
            .map(Some)
            .map_err(|reason| StoreError::Shape {
                path: self.path.clone(),
                reason,
            })
    }

    /// Like [`FeedConfigStore::load`] but a missing file reads as an empty list.
    pub fn load_or_empty(&self) -> Result<FeedDocument, StoreError> {
        Ok(self.load()?.unwrap_or_else(FeedDocument::empty))
    }

    pub fn save(&self, document: &FeedDocument) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &document.to_value())?;
        info!(
            "FeedConfigStore: wrote {} feed record(s) to {:?}",
            document.feeds.len(),
            self.path
        );
        Ok(())
    }
}
