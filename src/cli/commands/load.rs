use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(after_help = "The id-map file is rewritten whole at the end of a run. \
Do not run two loads against the same id-map at once: one run's ids will be lost.")]
pub struct LoadArgs {
    /// CSV file with a header row
    pub file: PathBuf,
    /// Target object type (e.g., Account, Product2)
    #[arg(short = 's', long = "sobjecttype")]
    pub object: String,
    /// External id field used as the upsert key
    #[arg(short = 'i', long = "externalid")]
    pub external_id: String,
    /// Id-map JSON file; created if missing
    #[arg(short = 'I', long)]
    pub idmap: PathBuf,
    /// Records per batch [default: settings.default_batch_size]
    #[arg(short, long)]
    pub batch: Option<usize>,
    /// Comma separated fields to leave out of the write
    #[arg(short = 'o', long = "ignorefields", value_delimiter = ',')]
    pub ignore_fields: Vec<String>,
    /// Comma separated fields whose text has every known old id replaced
    #[arg(short = 'R', long = "idreplacefields", value_delimiter = ',')]
    pub id_replace_fields: Vec<String>,
    /// Write through Bulk API 2.0 ingest jobs instead of anonymous Apex
    #[arg(long)]
    pub bulk: bool,
    /// Update existing records only; never insert
    #[arg(long, conflicts_with = "bulk")]
    pub update_only: bool,
    /// Print NEW/CHANGE/UNCHANGED per record before writing
    #[arg(long)]
    pub diff: bool,
    /// Skip the remote existence check of referenced ids
    #[arg(long)]
    pub no_id_check: bool,
    /// Transform, check and diff without writing or saving the id-map
    #[arg(long)]
    pub dry_run: bool,
    /// Environment to use instead of the current one
    #[arg(short, long)]
    pub env: Option<String>,
}
