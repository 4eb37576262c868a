use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use iso19139_gen::schema::default_schema_path;
use iso19139_gen::{FillRequest, MetadataFiller};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Template ISO 19139 metadata XML file
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// Georeferenced raster or vector dataset
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output XML metadata file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Metadata title for the dataset
    #[arg(long)]
    title: Option<String>,

    /// ANZLIC gmd.xsd (default: iso19139.anzlic/schema/gmd/gmd.xsd beside the executable)
    #[arg(long, value_name = "XSD")]
    schema: Option<PathBuf>,
}

fn main() -> Result<()> {
    // logging
    tracing_subscriber::fmt::init();

    // arguments
    let args = Args::parse();
    let start_time = std::time::Instant::now();

    // schema
    let schema_path = args.schema.clone().unwrap_or_else(default_schema_path);
    let mut filler = MetadataFiller::new(&schema_path)
        .with_context(|| format!("Failed to load schema {:?}", schema_path))?;

    let mut request = FillRequest::new(&args.template, &args.input, &args.output);
    if let Some(title) = args.title {
        request = request.with_title(title);
    }

    // fill and report elapsed time
    let context = || format!("Failed to fill {:?} from {:?}", args.template, args.input);
    let report = filler.fill(&request).with_context(context)?;

    info!(
        "Filled {} from {} dataset in {:?}",
        report.file_identifier,
        report.dataset_kind,
        start_time.elapsed()
    );

    Ok(())
}
