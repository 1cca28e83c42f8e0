//! Extract command - read invoice data from a single PDF or XML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use serde_json::{Map, Value};
use tracing::{debug, info};

use ferd_core::models::config::OutputConfig;
use ferd_core::pdf::open;
use ferd_core::{ExtractedInvoice, FieldName, InvoiceExtractor, ZugferdExtractor};

use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF with embedded invoice, or invoice XML)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include the raw invoice XML in the output
    #[arg(long)]
    raw: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if args.raw {
        config.output.include_raw_xml = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let extractor = ZugferdExtractor::from_config(&config.extraction);
    let invoice = extract_file(&args.input, &extractor)?;
    let output = format_invoice(&invoice, args.format, &config.output)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Open a container and run the extraction pipeline on its attachments.
pub fn extract_file(path: &Path, extractor: &ZugferdExtractor) -> anyhow::Result<ExtractedInvoice> {
    let source = open(path)?;
    let attachments = source.attachments()?;
    debug!("{} has {} attachment(s)", path.display(), attachments.len());
    Ok(extractor.extract(&attachments)?)
}

/// Render an invoice in the requested format.
pub fn format_invoice(
    invoice: &ExtractedInvoice,
    format: OutputFormat,
    output: &OutputConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => format_invoice_json(invoice, output),
        OutputFormat::Csv => format_invoice_csv(invoice, &output.not_available),
        OutputFormat::Text => Ok(format_invoice_text(invoice, output)),
    }
}

fn format_invoice_json(invoice: &ExtractedInvoice, output: &OutputConfig) -> anyhow::Result<String> {
    let mut fields = Map::new();
    for field in invoice.fields().values() {
        fields.insert(
            field.name.key().to_string(),
            Value::String(field.display_value(&output.not_available).to_string()),
        );
        if let Some(attribute) = &field.attribute {
            fields.insert(
                format!("{}_{}", field.name.key(), attribute_suffix(&attribute.name)),
                Value::String(attribute.value.clone()),
            );
        }
    }

    let mut root = Map::new();
    root.insert("schema_version".into(), Value::String(invoice.version().label().into()));
    root.insert("attachment".into(), Value::String(invoice.attachment_name().into()));
    root.insert("fields".into(), Value::Object(fields));
    if output.include_raw_xml {
        root.insert("raw_xml".into(), Value::String(invoice.raw_xml().into()));
    }

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

fn attribute_suffix(name: &str) -> &str {
    match name {
        "currencyID" => "currency",
        other => other,
    }
}

/// CSV header row: schema version, attachment, then every field key.
pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["schema_version", "attachment"];
    header.extend(FieldName::ALL.iter().map(|f| f.key()));
    header
}

/// CSV data row matching [`csv_header`].
pub fn csv_row<'a>(invoice: &'a ExtractedInvoice, marker: &'a str) -> Vec<&'a str> {
    let mut row = vec![invoice.version().label(), invoice.attachment_name()];
    row.extend(
        FieldName::ALL
            .iter()
            .map(|f| invoice.value(*f).unwrap_or(marker)),
    );
    row
}

fn format_invoice_csv(invoice: &ExtractedInvoice, marker: &str) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(csv_header())?;
    wtr.write_record(csv_row(invoice, marker))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_invoice_text(invoice: &ExtractedInvoice, output: &OutputConfig) -> String {
    let mut text = String::new();

    text.push_str(&format!(
        "ZUGFeRD {} invoice ({})\n\n",
        invoice.version().label(),
        invoice.attachment_name()
    ));

    for field in invoice.fields().values() {
        let label = format!("{}:", field.name.label());
        let value = match (&field.value, &field.attribute) {
            (Some(value), Some(attribute)) => format!("{} {}", value, attribute.value),
            _ => field.display_value(&output.not_available).to_string(),
        };
        text.push_str(&format!("  {:<20} {}\n", label, value));
    }

    let missing = invoice.missing_fields().len();
    if missing > 0 {
        text.push_str(&format!("\n{} of {} fields not available\n", missing, invoice.fields().len()));
    }

    if output.include_raw_xml {
        text.push('\n');
        text.push_str(invoice.raw_xml());
        text.push('\n');
    }

    text
}
