use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use connmeta_core::{AnnotationIndex, LookupResolution, PipelineOptions, enrich_json};

#[derive(Args, Debug, Clone)]
pub struct EnrichArgs {
    /// Draft OpenAPI document (JSON)
    #[arg(long, value_name = "FILE")]
    pub document: PathBuf,
    /// Annotation index (JSON)
    #[arg(long, value_name = "FILE")]
    pub annotations: PathBuf,
    /// Where to write the enriched document; stdout when omitted
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Fail when a lookup names no operation, or several
    #[arg(long)]
    pub strict_lookups: bool,
    /// Do not copy the first success response to `default`
    #[arg(long)]
    pub no_default_response: bool,
}

impl EnrichArgs {
    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            lookup_resolution: if self.strict_lookups {
                LookupResolution::Strict
            } else {
                LookupResolution::Permissive
            },
            synthesize_default_response: !self.no_default_response,
        }
    }
}

pub fn run(args: &EnrichArgs) -> i32 {
    match enrich_files(args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn enrich_files(args: &EnrichArgs) -> Result<(), String> {
    let document = read(&args.document)?;
    let index = AnnotationIndex::from_json(&read(&args.annotations)?)
        .map_err(|e| format!("Invalid annotation index {}: {e}", args.annotations.display()))?;

    let enriched = enrich_json(&document, &index, &args.options())
        .map_err(|e| format!("[{}] {e}", e.code()))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{enriched}\n"))
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
            info!(output = %path.display(), "Wrote enriched document.");
        }
        None => println!("{enriched}"),
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| {
        warn!(path = %path.display(), "Failed to read input.");
        format!("Failed to read {}: {e}", path.display())
    })
}
