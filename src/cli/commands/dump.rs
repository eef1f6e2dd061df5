use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Object type to export
    #[arg(short = 's', long = "sobjecttype")]
    pub object: String,
    /// Output CSV file
    #[arg(short = 'f', long = "file")]
    pub output: PathBuf,
    /// Id-map used to translate ids back to their source values
    #[arg(short = 'I', long)]
    pub idmap: PathBuf,
    /// Export a single record by id (translated through the id-map first)
    #[arg(long, conflicts_with = "where_clause")]
    pub id: Option<String>,
    /// SOQL WHERE condition, without the WHERE keyword
    #[arg(short = 'w', long = "where")]
    pub where_clause: Option<String>,
    /// Comma separated fields to export, in place of all fields
    #[arg(short = 'F', long = "only-fields", value_delimiter = ',')]
    pub only_fields: Vec<String>,
    /// Comma separated fields to skip [default: system audit fields]
    #[arg(short = 'o', long = "ignorefields", value_delimiter = ',')]
    pub ignore_fields: Option<Vec<String>>,
    /// Comma separated fields whose text has ids replaced through the reverse id-map
    #[arg(short = 'R', long = "idreplacefields", value_delimiter = ',')]
    pub id_replace_fields: Vec<String>,
    /// Environment to use instead of the current one
    #[arg(short, long)]
    pub env: Option<String>,
}
