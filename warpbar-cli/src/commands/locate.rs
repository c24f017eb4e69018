//! Locate command - show which Warp preferences file would be read.

use anyhow::Result;
use warpbar_core::{ErrorKind, LoadError};
use warpbar_store::Settings;

use crate::output::{CandidateOutput, JsonFormatter, LocateOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the locate command.
pub fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let locator = settings.locator();
    let selected = locator.locate();

    let candidates: Vec<(String, bool)> = locator
        .candidates()
        .iter()
        .map(|name| (name.clone(), locator.directory().join(name).is_file()))
        .collect();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_locate(locator.directory(), &candidates, selected.as_deref())
            );
        }
        OutputFormat::Json => {
            let output = LocateOutput {
                directory: locator.directory().display().to_string(),
                candidates: candidates
                    .iter()
                    .map(|(name, exists)| CandidateOutput {
                        name: name.clone(),
                        path: locator.directory().join(name).display().to_string(),
                        exists: *exists,
                    })
                    .collect(),
                selected: selected.as_ref().map(|p| p.display().to_string()),
            };
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    if selected.is_none() {
        return Err(LoadError::new(
            ErrorKind::SourceNotFound,
            "Warp preferences file not found. Ensure Warp is installed and has been run at least once.",
        )
        .into());
    }

    Ok(())
}
