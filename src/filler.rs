use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::document::MetadataDocument;
use crate::error::Result;
use crate::extent::{open_extent_provider, ExtentProvider};
use crate::model::{
    format_decimal, FillReport, IdentifierOrigin, DATE_STAMP, DATE_STAMP_FORMAT, FILE_IDENTIFIER,
    TITLE,
};
use crate::parser::parse_metadata_file;
use crate::schema::SchemaValidator;
use crate::writer::MetadataWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillRequest {
    pub template: PathBuf,
    pub dataset: PathBuf,
    pub output: PathBuf,
    pub title: Option<String>,
}

impl FillRequest {
    pub fn new(
        template: impl Into<PathBuf>,
        dataset: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template: template.into(),
            dataset: dataset.into(),
            output: output.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Fills ISO 19139 templates, validating before load and after write.
pub struct MetadataFiller {
    validator: SchemaValidator,
    writer: MetadataWriter,
}

impl MetadataFiller {
    pub fn new(schema_path: &Path) -> Result<Self> {
        let validator = SchemaValidator::from_file(schema_path)?;
        Ok(Self::with_validator(validator))
    }

    pub fn with_validator(validator: SchemaValidator) -> Self {
        Self {
            validator,
            writer: MetadataWriter::new(),
        }
    }

    /// Fills `request.template` from the GDAL dataset at `request.dataset`.
    pub fn fill(&mut self, request: &FillRequest) -> Result<FillReport> {
        self.fill_with(request, open_extent_provider)
    }

    /// Like [`fill`](Self::fill) with a custom extent source.
    ///
    /// `open_provider` runs only after the template has passed validation
    /// and the identifier, date stamp and title are resolved.
    pub fn fill_with<F>(&mut self, request: &FillRequest, open_provider: F) -> Result<FillReport>
    where
        F: FnOnce(&Path) -> Result<Box<dyn ExtentProvider>>,
    {
        // validate
        self.validator.validate_file(&request.template)?;
        let mut document = parse_metadata_file(&request.template)?;

        // identifier
        let (file_identifier, identifier_origin) = resolve_identifier(&mut document)?;

        // date stamp
        let date_stamp = Utc::now().format(DATE_STAMP_FORMAT).to_string();
        info!("Adding gmd:dateStamp {}", date_stamp);
        document.assign(&DATE_STAMP, &date_stamp)?;

        // title
        if let Some(title) = &request.title {
            info!("Adding gmd:title {}", title);
            document.assign(&TITLE, title)?;
        }

        // extent
        let provider = open_provider(&request.dataset)?;
        let extent = provider.extent()?;
        for (path, value) in extent.fields() {
            let text = format_decimal(value);
            info!("Adding gmd:{} {}", path.property, text);
            document.assign(&path, &text)?;
        }

        // write
        self.writer.write(&document, &request.output)?;
        info!("Written to {:?}", request.output);

        // revalidate
        self.validator.validate_file(&request.output)?;
        info!("Validation OK");

        Ok(FillReport {
            file_identifier,
            identifier_origin,
            date_stamp,
            title: request.title.clone(),
            extent,
            dataset_kind: provider.kind(),
            output: request.output.clone(),
        })
    }
}

/// Keeps an existing identifier, otherwise writes a fresh UUID v4.
fn resolve_identifier(document: &mut MetadataDocument) -> Result<(String, IdentifierOrigin)> {
    let leaf = document.locate(&FILE_IDENTIFIER)?;
    match document.text(leaf)? {
        Some(existing) => {
            info!("Existing gmd:fileIdentifier {}", existing);
            Ok((existing, IdentifierOrigin::Existing))
        }
        None => {
            let generated = Uuid::new_v4().to_string();
            info!("Adding gmd:fileIdentifier {}", generated);
            document.set_text(leaf, &generated);
            Ok((generated, IdentifierOrigin::Generated))
        }
    }
}
