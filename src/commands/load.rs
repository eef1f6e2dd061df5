use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

use super::connect;
use crate::cli::commands::LoadArgs;
use crate::config::Config;
use crate::load::{BatchDriver, IdMapFile, LoadMode, LoadOptions, read_records, validate_external_ids};

pub async fn load_command(args: LoadArgs) -> Result<()> {
    info!("Loading {:?} into {}", args.file, args.object);

    let config = Config::load()?;
    let records = read_records(&args.file)
        .with_context(|| format!("Failed to read input file: {:?}", args.file))?;

    let mode = if args.bulk { LoadMode::Bulk } else { LoadMode::Script };
    let options = LoadOptions::new(&args.object, &args.external_id)
        .with_batch_size(args.batch.unwrap_or(config.settings.default_batch_size))
        .with_ignore_fields(&args.ignore_fields)
        .with_content_replace(&args.id_replace_fields)
        .with_mode(mode)
        .update_only(args.update_only)
        .with_diff(args.diff)
        .with_id_check(!args.no_id_check)
        .dry_run(args.dry_run)
        .with_poll(config.settings.poll_settings());

    // Reject bad input before authenticating.
    validate_external_ids(&records, &options.external_id_key())?;

    let client = connect(&config, args.env.as_deref()).await?;
    let mut idmap = IdMapFile::open(&args.idmap);

    let report = BatchDriver::new(&client, &options)
        .run(&records, &mut idmap)
        .await?;

    println!();
    println!(
        "{} records in {} batches, {} id-map entries written, {} unresolved",
        records.len(),
        report.batches.len(),
        report.mapped,
        report.unresolved
    );
    if options.diff {
        println!(
            "Diff: {} new, {} changed, {} unchanged",
            report.diff.new, report.diff.changed, report.diff.unchanged
        );
    }

    if !report.is_success() {
        for batch in report.failed_batches() {
            println!(
                "{} batch#{}: {}",
                "✗".bright_red().bold(),
                batch.index,
                batch.error.as_deref().unwrap_or_default()
            );
        }
        let failed = report.failed_batches().count();
        anyhow::bail!("{} of {} batches failed", failed, report.batches.len());
    }

    if report.dry_run {
        println!("{} Dry run complete, nothing written", "✓".bright_green().bold());
    } else {
        println!("{} Data successfully loaded", "✓".bright_green().bold());
    }
    Ok(())
}
