//! Rendering-engine boundary.
//!
//! The engine that lays out and paginates reports is a black box; the
//! core only opens and saves design documents through [`DesignEngine`]
//! and hands render work to [`RenderEngine`] with a validated output
//! format. [`JsonDesignEngine`] is the shipped document codec.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::design::{DesignDocument, DesignError, DesignResult};
use crate::form::OutputFormat;
use crate::storage::FileStore;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised at the rendering boundary.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The requested content type is not in the supported format table.
    /// Raised before the engine is touched.
    #[error("unsupported output content type: '{0}'")]
    UnsupportedFormat(String),

    /// The external engine failed; its message is wrapped, not leaked as
    /// an opaque trace.
    #[error("render engine error: {0}")]
    Engine(String),
}

/// Capability for opening and saving design documents.
pub trait DesignEngine {
    /// Open the document stored at `path`.
    fn open(&self, path: &Path, files: &dyn FileStore) -> DesignResult<DesignDocument>;

    /// Open a document from caller-supplied bytes (an uploaded design).
    fn open_bytes(&self, origin: &Path, bytes: &[u8]) -> DesignResult<DesignDocument>;

    /// Persist `document` at `path` in one atomic write.
    fn save(
        &self,
        document: &DesignDocument,
        path: &Path,
        files: &dyn FileStore,
    ) -> DesignResult<()>;
}

/// Capability over the external report renderer.
pub trait RenderEngine {
    /// Render the design at `design_path` into `output`. The format has
    /// already been validated against the supported table.
    fn render(
        &self,
        design_path: &Path,
        format: &OutputFormat,
        locale: &str,
        parameters: &BTreeMap<String, String>,
        output: &mut dyn Write,
    ) -> RenderResult<()>;
}

/// JSON codec for design documents.
#[derive(Debug, Default)]
pub struct JsonDesignEngine;

impl JsonDesignEngine {
    pub fn new() -> Self {
        JsonDesignEngine
    }
}

impl DesignEngine for JsonDesignEngine {
    fn open(&self, path: &Path, files: &dyn FileStore) -> DesignResult<DesignDocument> {
        let bytes = files.read(path).map_err(|e| DesignError::Open {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        DesignDocument::from_json(path, &bytes)
    }

    fn open_bytes(&self, origin: &Path, bytes: &[u8]) -> DesignResult<DesignDocument> {
        DesignDocument::from_json(origin, bytes)
    }

    fn save(
        &self,
        document: &DesignDocument,
        path: &Path,
        files: &dyn FileStore,
    ) -> DesignResult<()> {
        files.write(path, &document.to_json())?;
        Ok(())
    }
}
