//! Batch command - extract invoice data from many files with a worker pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use ferd_core::{ExtractedInvoice, ZugferdExtractor};

use super::extract::{OutputFormat, csv_header, csv_row, extract_file, format_invoice};
use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    invoice: Option<ExtractedInvoice>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Arc::new(ZugferdExtractor::from_config(&config.extraction));
    let jobs = args.jobs.max(1);
    debug!("Processing {} files with {} workers", files.len(), jobs);

    // `buffered` keeps input order regardless of completion order.
    let mut pending = stream::iter(files)
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            async move { process_file(path, extractor).await }
        })
        .buffered(jobs);

    let mut results = Vec::new();
    while let Some(result) = pending.next().await {
        overall_pb.inc(1);
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                overall_pb.abandon();
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), error_msg);
            }
        }
        results.push(result);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.invoice.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(invoice) = &result.invoice {
                let output_path = output_dir.join(output_file_name(&result.path, args.format));

                let content = format_invoice(invoice, args.format, &config.output)?;
                fs::write(&output_path, content)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results, &config.output.not_available)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!("  Successful: {}", style(successful.len()).green());
    if !failed.is_empty() {
        println!("  Failed: {}", style(failed.len()).red());
        for result in &failed {
            println!(
                "    - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "xml")
}

/// Output file name for `input`: the full source file name plus the format extension.
fn output_file_name(input: &Path, format: OutputFormat) -> String {
    let source = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoice".to_string());
    format!("{}.{}", source, format.extension())
}

async fn process_file(path: PathBuf, extractor: Arc<ZugferdExtractor>) -> ProcessResult {
    let file_start = Instant::now();

    let job_path = path.clone();
    let outcome = tokio::task::spawn_blocking(move || extract_file(&job_path, &extractor)).await;
    let processing_time_ms = file_start.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => Err(anyhow::anyhow!("worker failed: {}", e)),
    };

    match result {
        Ok(invoice) => ProcessResult {
            path,
            invoice: Some(invoice),
            error: None,
            processing_time_ms,
        },
        Err(e) => ProcessResult {
            path,
            invoice: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

fn write_summary(path: &Path, results: &[ProcessResult], marker: &str) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend(csv_header());
    header.extend(["processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    let empty_fields = vec![""; csv_header().len()];

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let time = result.processing_time_ms.to_string();

        let mut record = vec![filename];
        match &result.invoice {
            Some(invoice) => {
                record.push("success");
                record.extend(csv_row(invoice, marker));
                record.extend([time.as_str(), ""]);
            }
            None => {
                record.push("error");
                record.extend(empty_fields.iter().copied());
                record.extend([time.as_str(), result.error.as_deref().unwrap_or("")]);
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_keep_source_extension() {
        let pdf = output_file_name(Path::new("in/a.pdf"), OutputFormat::Json);
        let xml = output_file_name(Path::new("in/a.xml"), OutputFormat::Json);
        assert_eq!(pdf, "a.pdf.json");
        assert_eq!(xml, "a.xml.json");
        assert_eq!(output_file_name(Path::new("b.PDF"), OutputFormat::Text), "b.PDF.txt");
    }
}
