use std::env;
use std::path::{Path, PathBuf};

use libxml::error::StructuredError;
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};
use tracing::debug;

use crate::error::{FillError, Result};

/// Location of the ANZLIC `gmd` schema relative to the executable.
pub const DEFAULT_SCHEMA_PATH: &str = "iso19139.anzlic/schema/gmd/gmd.xsd";

/// Default schema: next to the executable, else under the working directory.
pub fn default_schema_path() -> PathBuf {
    let beside_exe = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_SCHEMA_PATH)));
    match beside_exe {
        Some(path) if path.is_file() => path,
        _ => PathBuf::from(DEFAULT_SCHEMA_PATH),
    }
}

/// XSD gate applied to metadata files before loading and after writing.
pub struct SchemaValidator {
    schema_path: PathBuf,
    context: SchemaValidationContext,
}

impl SchemaValidator {
    /// Compiles the schema. Imports resolve relative to `schema_path`.
    pub fn from_file(schema_path: &Path) -> Result<Self> {
        let load_error = |messages| FillError::SchemaLoad {
            path: schema_path.to_path_buf(),
            messages,
        };

        if !schema_path.is_file() {
            return Err(load_error(vec!["file not found".to_string()]));
        }
        let path_str = schema_path
            .to_str()
            .ok_or_else(|| load_error(vec!["path is not valid UTF-8".to_string()]))?;

        let mut parser = SchemaParserContext::from_file(path_str);
        let context = SchemaValidationContext::from_parser(&mut parser)
            .map_err(|errors| load_error(describe(&errors)))?;

        debug!("Loaded schema {:?}", schema_path);
        Ok(Self {
            schema_path: schema_path.to_path_buf(),
            context,
        })
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Parses and validates the document at `path`.
    pub fn validate_file(&mut self, path: &Path) -> Result<()> {
        let invalid = |messages| FillError::SchemaValidation {
            path: path.to_path_buf(),
            messages,
        };

        if !path.is_file() {
            return Err(invalid(vec!["file not found".to_string()]));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| invalid(vec!["path is not valid UTF-8".to_string()]))?;

        self.context
            .validate_file(path_str)
            .map_err(|errors| invalid(describe(&errors)))?;
        debug!("{:?} is valid against {:?}", path, self.schema_path);
        Ok(())
    }
}

#[allow(deprecated)]
fn describe(errors: &[StructuredError]) -> Vec<String> {
    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            let message = e.message.as_deref().unwrap_or("unknown error").trim();
            match e.line {
                Some(line) => format!("line {}: {}", line, message),
                None => message.to_string(),
            }
        })
        .collect();
    if messages.is_empty() {
        vec!["document rejected".to_string()]
    } else {
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:test" xmlns="urn:test" elementFormDefault="qualified">
  <xs:element name="record">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="when" type="xs:dateTime"/>
        <xs:element name="value" type="xs:decimal"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    fn setup(dir: &TempDir) -> SchemaValidator {
        let schema_path = dir.path().join("test.xsd");
        fs::write(&schema_path, SCHEMA).unwrap();
        SchemaValidator::from_file(&schema_path).unwrap()
    }

    #[test]
    fn test_valid_document() {
        let dir = TempDir::new().unwrap();
        let mut validator = setup(&dir);
        assert_eq!(validator.schema_path(), dir.path().join("test.xsd"));
        let doc = dir.path().join("ok.xml");
        fs::write(
            &doc,
            r#"<record xmlns="urn:test"><when>2024-05-01T10:20:30</when><value>-12.5</value></record>"#,
        )
        .unwrap();
        validator.validate_file(&doc).unwrap();
    }

    #[test]
    fn test_invalid_document_reports_messages() {
        let dir = TempDir::new().unwrap();
        let mut validator = setup(&dir);
        let doc = dir.path().join("bad.xml");
        fs::write(
            &doc,
            r#"<record xmlns="urn:test"><when>yesterday</when><value>1e5</value></record>"#,
        )
        .unwrap();

        match validator.validate_file(&doc).unwrap_err() {
            FillError::SchemaValidation { path, messages } => {
                assert_eq!(path, doc);
                assert!(!messages.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_document() {
        let dir = TempDir::new().unwrap();
        let mut validator = setup(&dir);
        let err = validator
            .validate_file(&dir.path().join("absent.xml"))
            .unwrap_err();
        assert!(matches!(err, FillError::SchemaValidation { .. }));
    }

    #[test]
    fn test_missing_schema() {
        let dir = TempDir::new().unwrap();
        let err = SchemaValidator::from_file(&dir.path().join("none.xsd"))
            .err()
            .unwrap();
        assert!(matches!(err, FillError::SchemaLoad { .. }));
    }
}
