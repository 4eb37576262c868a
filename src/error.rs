use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FillError>;

#[derive(Debug, Error)]
pub enum FillError {
    #[error("failed to load schema {path:?}: {}", .messages.join("; "))]
    SchemaLoad {
        path: PathBuf,
        messages: Vec<String>,
    },

    #[error("schema validation failed for {path:?}: {}", .messages.join("; "))]
    SchemaValidation {
        path: PathBuf,
        messages: Vec<String>,
    },

    #[error("failed to open dataset {path:?}")]
    DatasetOpen {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("dataset {path:?} has no usable geo-referencing: {reason}")]
    GeoReference { path: PathBuf, reason: String },

    #[error("template is missing {field}")]
    TemplateStructure { field: String },

    #[error("template declares encoding {encoding}; only UTF-8 is supported")]
    UnsupportedEncoding { encoding: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FillError {
    pub(crate) fn geo_reference(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FillError::GeoReference {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
