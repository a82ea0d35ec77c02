use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Generate TypeScript bindings and JSON schemas for the visit history records")]
struct Args {
    /// Output directory for generated `.ts` files
    #[arg(short = 'o', long = "out", value_name = "DIR")]
    out_dir: PathBuf,

    /// Optional path to the Prettier executable to format generated files
    #[arg(short = 'p', long = "prettier", value_name = "PRETTIER_BIN")]
    prettier: Option<PathBuf>,

    /// Also write JSON schemas for the persisted keys into this directory
    #[arg(long = "schema-out", value_name = "DIR")]
    schema_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    xtrail_protocol::export::generate_ts(&args.out_dir, args.prettier.as_deref())?;
    if let Some(schema_dir) = args.schema_out {
        for path in xtrail_protocol::export::generate_json_schema(&schema_dir)? {
            println!("{}", path.display());
        }
    }
    Ok(())
}
