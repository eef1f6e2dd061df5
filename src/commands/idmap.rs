use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::load::{IdMap, is_valid_id, to_18};

pub fn show_command(file: &Path) -> Result<()> {
    let map = IdMap::load(file);
    if map.is_empty() {
        println!("No entries in {}", file.display());
        return Ok(());
    }

    for (old, new) in map.iter() {
        println!("{} => {}", old, new);
    }
    println!("\n{} entries", map.len());
    Ok(())
}

pub fn lookup_command(file: &Path, id: &str, reverse: bool) -> Result<()> {
    let map = IdMap::load(file);
    let map = if reverse { map.reverse() } else { map };

    match map.get(id) {
        Some(mapped) => println!("{} => {}", id, mapped),
        None => anyhow::bail!("'{}' not found in {}", id, file.display()),
    }
    Ok(())
}

pub fn check_command(id: &str) -> Result<()> {
    let candidate = if id.len() == 15 {
        to_18(id).unwrap_or_else(|| id.to_string())
    } else {
        id.to_string()
    };

    if is_valid_id(&candidate) {
        println!("{} {} is a valid record id", "✓".bright_green().bold(), candidate);
        Ok(())
    } else {
        anyhow::bail!("'{}' is not a valid record id", id)
    }
}
