use anyhow::Result;
use clap::Parser;
use log::info;

use sf_migrate::cli::Cli;
use sf_migrate::cli::app::Commands;
use sf_migrate::cli::commands::{AuthSubcommands, IdmapSubcommands};
use sf_migrate::commands;
use sf_migrate::commands::auth::{
    SetupOptions, remove_command, select_command, setup_command, status_command,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("sf-migrate.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting sf-migrate");

    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthSubcommands::Setup {
                name,
                login_url,
                username,
                password,
                client_id,
                client_secret,
                instance_url,
                access_token,
                from_env,
                from_env_file,
            } => {
                setup_command(SetupOptions {
                    name,
                    login_url,
                    username,
                    password,
                    client_id,
                    client_secret,
                    instance_url,
                    access_token,
                    from_env,
                    from_env_file,
                })
                .await?;
            }
            AuthSubcommands::Select { name, check } => select_command(name, check).await?,
            AuthSubcommands::Remove {
                name,
                force,
                token_only,
            } => remove_command(name, force, token_only).await?,
            AuthSubcommands::Status { name, offline } => status_command(name, offline).await?,
        },
        Commands::Load(load_args) => {
            commands::load::load_command(load_args).await?;
        }
        Commands::Dump(dump_args) => {
            commands::dump::dump_command(dump_args).await?;
        }
        Commands::Idmap(idmap_args) => match idmap_args.command {
            IdmapSubcommands::Show { file } => commands::idmap::show_command(&file)?,
            IdmapSubcommands::Lookup { file, id, reverse } => {
                commands::idmap::lookup_command(&file, &id, reverse)?
            }
            IdmapSubcommands::Check { id } => commands::idmap::check_command(&id)?,
        },
    }

    Ok(())
}
