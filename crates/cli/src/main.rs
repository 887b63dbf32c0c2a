mod output;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use zpl_label_core::{DataRow, DataSet, LabelDesign, LabelSize, label_count};
use zpl_label_print_client::{AddressPolicy, DEFAULT_PORT, Dispatcher};

use crate::output::{Format, failure, success};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "zpl-label",
    version,
    about = "Render label designs to ZPL and send them to network label printers"
)]
struct Cli {
    /// Output mode: "pretty" for terminal output, "json" for machine-readable
    /// JSON. Defaults to "pretty" when stdout is a TTY, "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Comma-separated printer IPs that may be targeted. When unset, any
    /// non-reserved IPv4 address is allowed.
    #[arg(long, global = true, env = "ALLOWED_PRINTER_IPS")]
    allow: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Render a label design (JSON) to ZPL.
    Render {
        /// Path to the design file.
        design: String,
        #[command(flatten)]
        data: DataArgs,
        /// Write the ZPL to this file instead of stdout.
        #[arg(long, short)]
        out: Option<String>,
    },

    /// Send a ZPL file, or a rendered design, to a printer.
    Print {
        /// A `.zpl` file (sent verbatim) or a design file (rendered first).
        file: String,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        data: DataArgs,
    },

    /// Check that a printer accepts connections.
    TestConnection {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print the built-in diagnostic label.
    TestLabel {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Check a printer address against the address policy (no network).
    CheckAddress {
        /// Printer IPv4 address.
        address: String,
        /// Printer port.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Printer IPv4 address.
    #[arg(long)]
    printer: String,
    /// Printer port (9100-9109).
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// CSV file with one row per record; fields bind to elements by column.
    #[arg(long)]
    data: Option<String>,
    /// Column holding per-row copy counts. Overrides the design's setting
    /// and header detection.
    #[arg(long)]
    quantity_column: Option<String>,
    /// Label size in inches (e.g. 4x6). Overrides the design's size.
    #[arg(long)]
    size: Option<LabelSize>,
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match run(cli, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            failure(format, &err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let allow = cli.allow.as_deref();
    match cli.cmd {
        Cmd::Render { design, data, out } => cmd_render(&design, &data, out.as_deref(), format),
        Cmd::Print { file, target, data } => cmd_print(&file, &target, &data, allow, format),
        Cmd::TestConnection { target } => cmd_test_connection(&target, allow, format),
        Cmd::TestLabel { target } => cmd_test_label(&target, allow, format),
        Cmd::CheckAddress { address, port } => cmd_check_address(&address, port, allow, format),
    }
}

/// Route `tracing` output to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_render(design_path: &str, data: &DataArgs, out: Option<&str>, format: Format) -> Result<()> {
    let job = RenderJob::load(design_path, data)?;
    let zpl = job.render();
    let labels = job.label_count();

    match (format, out) {
        (_, Some(path)) => {
            fs::write(path, &zpl).with_context(|| format!("failed to write '{path}'"))?;
            success(
                format,
                &format!("rendered {labels} label(s) to {path}"),
                json!({ "labels": labels, "out": path }),
            )?;
        }
        (Format::Json, None) => {
            success(
                format,
                &format!("rendered {labels} label(s)"),
                json!({ "labels": labels, "zpl": zpl }),
            )?;
        }
        (Format::Pretty, None) => {
            // The document is the expected output; the summary goes to stderr.
            print!("{zpl}");
            eprintln!("rendered {labels} label(s)");
        }
    }
    Ok(())
}

fn cmd_print(
    file: &str,
    target: &TargetArgs,
    data: &DataArgs,
    allow: Option<&str>,
    format: Format,
) -> Result<()> {
    let payload = if is_zpl_file(file) {
        fs::read(file).with_context(|| format!("failed to read '{file}'"))?
    } else {
        RenderJob::load(file, data)?.render().into_bytes()
    };

    let report = dispatcher(allow).send(&payload, &target.printer, target.port)?;
    success(
        format,
        "ZPL sent to printer successfully",
        serde_json::to_value(report)?,
    )
}

fn cmd_test_connection(target: &TargetArgs, allow: Option<&str>, format: Format) -> Result<()> {
    let report = dispatcher(allow).test_connection(&target.printer, target.port)?;
    success(
        format,
        "Printer connection successful",
        serde_json::to_value(report)?,
    )
}

fn cmd_test_label(target: &TargetArgs, allow: Option<&str>, format: Format) -> Result<()> {
    let timestamp = test_label_timestamp(chrono::Utc::now());
    let report = dispatcher(allow).print_test_label(&target.printer, target.port, &timestamp)?;
    success(
        format,
        "Test label sent successfully",
        serde_json::to_value(report)?,
    )
}

fn cmd_check_address(address: &str, port: u16, allow: Option<&str>, format: Format) -> Result<()> {
    let target = AddressPolicy::from_config(allow).validate(address, port)?;
    success(
        format,
        "Printer address allowed",
        json!({ "address": target.to_string() }),
    )
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// ISO 8601 UTC with milliseconds and a `Z` suffix (`2026-10-15T09:30:00.000Z`).
fn test_label_timestamp(now: chrono::DateTime<chrono::Utc>) -> String {
    now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn dispatcher(allow: Option<&str>) -> Dispatcher {
    Dispatcher::new(AddressPolicy::from_config(allow))
}

fn is_zpl_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zpl"))
}

/// A design bound to its data rows, ready to render.
struct RenderJob {
    design: LabelDesign,
    rows: Vec<DataRow>,
    quantity_column: Option<String>,
}

impl RenderJob {
    /// Load the design and optional CSV. The quantity column is taken from
    /// `--quantity-column`, else the design, else detected from the CSV
    /// headers.
    fn load(design_path: &str, args: &DataArgs) -> Result<Self> {
        let text = fs::read_to_string(design_path)
            .with_context(|| format!("failed to read design '{design_path}'"))?;
        let mut design: LabelDesign = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse design '{design_path}'"))?;
        if let Some(size) = &args.size {
            design.label_size = size.clone();
        }

        let (rows, detected) = match &args.data {
            Some(path) => {
                let csv = fs::read_to_string(path)
                    .with_context(|| format!("failed to read data '{path}'"))?;
                let set = DataSet::parse_csv(&csv)
                    .with_context(|| format!("failed to import data '{path}'"))?;
                let detected = set.detect_quantity_column().map(str::to_string);
                (set.rows, detected)
            }
            // A design without data prints once with its stored content.
            None => (vec![DataRow::new()], None),
        };

        let quantity_column = args
            .quantity_column
            .clone()
            .filter(|c| !c.is_empty())
            .or_else(|| design.quantity_column().map(str::to_string))
            .or(detected);

        tracing::debug!(
            design = design_path,
            rows = rows.len(),
            quantity_column = quantity_column.as_deref(),
            "render job loaded"
        );
        Ok(Self {
            design,
            rows,
            quantity_column,
        })
    }

    fn render(&self) -> String {
        zpl_label_core::render(
            &self.design.elements,
            &self.design.label_size,
            &self.rows,
            self.quantity_column.as_deref(),
        )
    }

    fn label_count(&self) -> u64 {
        label_count(&self.rows, self.quantity_column.as_deref())
    }
}
