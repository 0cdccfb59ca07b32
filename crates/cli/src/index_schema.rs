use clap::Args;

use connmeta_core::AnnotationIndex;

#[derive(Args, Debug, Clone)]
pub struct IndexSchemaArgs {
    /// Print on a single line
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: &IndexSchemaArgs) -> i32 {
    let schema = AnnotationIndex::json_schema();
    let rendered = if args.compact {
        serde_json::to_string(&schema)
    } else {
        serde_json::to_string_pretty(&schema)
    };
    match rendered {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(err) => {
            eprintln!("Failed to render schema: {err}");
            1
        }
    }
}
