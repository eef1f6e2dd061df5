use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args)]
pub struct IdmapCommands {
    #[command(subcommand)]
    pub command: IdmapSubcommands,
}

#[derive(Subcommand)]
pub enum IdmapSubcommands {
    /// Print every entry of an id-map file
    Show {
        /// Id-map JSON file
        file: PathBuf,
    },
    /// Print the id an entry maps to
    Lookup {
        /// Id-map JSON file
        file: PathBuf,
        /// Id to look up
        id: String,
        /// Look up a new id and print the old one
        #[arg(short, long)]
        reverse: bool,
    },
    /// Check whether a value is a well-formed 18-character record id
    Check {
        /// Value to check; 15-character ids are also accepted
        id: String,
    },
}
