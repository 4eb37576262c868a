pub mod document;
pub mod error;
pub mod extent;
pub mod filler;
pub mod model;
pub mod parser;
pub mod schema;
pub mod writer;

pub use document::MetadataDocument;
pub use error::{FillError, Result};
pub use extent::{
    open_extent_provider, ExtentProvider, RasterExtentProvider, VectorExtentProvider,
};
pub use filler::{FillRequest, MetadataFiller};
pub use model::{BoundingBox, DatasetKind, FillReport, IdentifierOrigin};
pub use schema::SchemaValidator;
pub use writer::MetadataWriter;
