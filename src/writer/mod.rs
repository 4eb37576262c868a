use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::Writer;

use crate::document::MetadataDocument;
use crate::error::Result;

#[derive(Default)]
pub struct MetadataWriter {}

impl MetadataWriter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn write(&self, document: &MetadataDocument, output_path: &Path) -> Result<()> {
        let file = File::create(output_path)?;
        let mut writer = self.write_to(document, BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }

    /// Serializes the events unchanged and returns the sink.
    pub fn write_to<W: Write>(&self, document: &MetadataDocument, sink: W) -> Result<W> {
        let mut writer = Writer::new(sink);
        for event in document.events() {
            writer.write_event(event.clone())?;
        }
        Ok(writer.into_inner())
    }
}
