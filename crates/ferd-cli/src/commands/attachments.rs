//! Attachments command - list the files embedded in a container.

use std::path::PathBuf;

use clap::Args;
use console::style;

use ferd_core::invoice::locate_with_suffix;
use ferd_core::pdf::open;

use super::load_config;

/// Arguments for the attachments command.
#[derive(Args)]
pub struct AttachmentsArgs {
    /// Input file (PDF or XML)
    #[arg(required = true)]
    input: PathBuf,
}

pub async fn run(args: AttachmentsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let attachments = open(&args.input)?.attachments()?;
    if attachments.is_empty() {
        println!("{} No embedded attachments", style("ℹ").blue());
        return Ok(());
    }

    let selected = locate_with_suffix(&attachments, &config.extraction.attachment_suffix).ok();

    for attachment in &attachments {
        let marker = if selected.is_some_and(|s| std::ptr::eq(s, attachment)) {
            style("invoice").green().to_string()
        } else {
            String::new()
        };
        println!("{:<40} {:>10} bytes  {}", attachment.name, attachment.size(), marker);
    }

    if selected.is_none() {
        println!();
        println!(
            "{} No attachment ending in '{}'",
            style("!").yellow(),
            config.extraction.attachment_suffix
        );
    }

    Ok(())
}
