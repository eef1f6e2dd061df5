use anyhow::{Context, Result};
use log::info;

use super::connect;
use crate::cli::commands::DumpArgs;
use crate::config::Config;
use crate::dump::{DumpOptions, export_records};
use crate::load::IdMapFile;

pub async fn dump_command(args: DumpArgs) -> Result<()> {
    info!("Dumping {} to {:?}", args.object, args.output);

    let config = Config::load()?;

    let mut options = DumpOptions::new(&args.object)
        .with_only_fields(&args.only_fields)
        .with_content_replace(&args.id_replace_fields);
    if let Some(ignore) = &args.ignore_fields {
        options = options.with_ignore_fields(ignore);
    }
    options.id = args.id;
    options.where_clause = args.where_clause;

    let idmap = IdMapFile::open(&args.idmap);
    if idmap.map().is_empty() {
        println!("Id-map {:?} is empty, ids will not be reverse mapped", args.idmap);
    }

    let client = connect(&config, args.env.as_deref()).await?;
    let table = export_records(&client, &options, idmap.map()).await?;

    table
        .write_csv(&args.output)
        .with_context(|| format!("Failed to write {:?}", args.output))?;

    println!("✓ Wrote {} records to {}", table.rows.len(), args.output.display());
    Ok(())
}
