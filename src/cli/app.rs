use super::commands::{AuthCommands, DumpArgs, IdmapCommands, LoadArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sf-migrate")]
#[command(version)]
#[command(about = "Move records between Salesforce orgs, remapping ids along the way")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication management
    Auth(AuthCommands),
    /// Upsert CSV records in batches and record old => new ids
    Load(LoadArgs),
    /// Export records to CSV, translating ids back through the id-map
    Dump(DumpArgs),
    /// Inspect id-map files and record ids
    Idmap(IdmapCommands),
}
