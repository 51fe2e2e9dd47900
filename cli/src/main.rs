//! docxmap CLI - DOCX template tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};

use docxmap::convert::PROGRAM_ENV;
use docxmap::render::{self, value_to_json};
use docxmap::{
    detect_format_from_path, ConvertOptions, DocxMap, DocumentConverter, JsonFormat,
    LibreOfficeConverter, MappingRegistry, OutcomeStatus, PlaceholderEngine, RenderOptions,
    RenderStatus,
};

#[derive(Parser)]
#[command(name = "docxmap")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Turn DOCX documents into fill-in templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the paragraph/table structure as JSON
    Structure {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the document as plain text
    Text {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show document information
    Info {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Write placeholders and loop markers into a copy of the document
    Publish {
        /// Source DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Mappings (JSON array)
        #[arg(short, long, value_name = "FILE")]
        mappings: PathBuf,

        /// Output template file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Fail if any mapping cannot be applied
        #[arg(long)]
        abort_on_missing: bool,
    },

    /// Print the input schema derived from mappings
    Schema {
        /// Mappings (JSON array)
        #[arg(short, long, value_name = "FILE")]
        mappings: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Fill a published template with data
    Render {
        /// Published template DOCX
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Mappings the template was published with (JSON array)
        #[arg(short, long, value_name = "FILE")]
        mappings: PathBuf,

        /// Data (JSON object)
        #[arg(short, long, value_name = "FILE")]
        data: PathBuf,

        /// Output DOCX file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Also produce a PDF next to the output
        #[arg(long)]
        pdf: bool,

        /// LibreOffice executable used for PDF conversion
        #[arg(long, value_name = "PATH", env = PROGRAM_ENV)]
        soffice: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Structure {
            input,
            output,
            compact,
        } => cmd_structure(&input, output.as_deref(), compact),
        Commands::Text { input } => cmd_text(&input),
        Commands::Info { input } => cmd_info(&input),
        Commands::Publish {
            input,
            mappings,
            output,
            abort_on_missing,
        } => cmd_publish(&input, &mappings, &output, abort_on_missing),
        Commands::Schema { mappings, compact } => cmd_schema(&mappings, compact),
        Commands::Render {
            template,
            mappings,
            data,
            output,
            pdf,
            soffice,
        } => cmd_render(&template, &mappings, &data, &output, pdf, soffice),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn load_mappings(path: &Path) -> Result<MappingRegistry, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    let registry = MappingRegistry::from_json(&json)?;
    log::debug!("Loaded {} mapping(s) from {}", registry.len(), path.display());
    Ok(registry)
}

fn cmd_structure(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = DocxMap::new().parse(input)?.to_json(json_format(compact))?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_text(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = DocxMap::new().lenient().text_only().parse(input)?.to_text();
    println!("{}", text);
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let format = detect_format_from_path(input)?;
    let result = DocxMap::new().lenient().parse(input)?;
    let doc = result.structure();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);
    println!(
        "{}: {}",
        "Styles".bold(),
        if format.has_styles { "Yes" } else { "No" }
    );

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    let headings = doc.paragraphs.iter().filter(|p| p.is_heading).count();
    let rows: usize = doc.tables.iter().map(|t| t.row_count()).sum();

    println!("{}: {}", "Paragraphs".bold(), doc.total_paragraphs());
    println!("{}: {}", "Headings".bold(), headings);
    println!("{}: {}", "Tables".bold(), doc.total_tables());
    println!("{}: {}", "Table rows".bold(), rows);
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());

    Ok(())
}

fn cmd_publish(
    input: &Path,
    mappings: &Path,
    output: &Path,
    abort_on_missing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_mappings(mappings)?;
    if registry.is_empty() {
        return Err("mapping list is empty".into());
    }

    let mut builder = DocxMap::new();
    if abort_on_missing {
        builder = builder.abort_on_failure();
    }
    let (template, report) = builder.parse(input)?.materialize(&registry)?;

    for outcome in &report.outcomes {
        match &outcome.status {
            OutcomeStatus::Applied => println!(
                "  {} {} ({})",
                "✓".green(),
                outcome.target,
                outcome.location.dimmed()
            ),
            OutcomeStatus::Failed { reason } => println!(
                "  {} {} ({}): {}",
                "✗".red(),
                outcome.target,
                outcome.location.dimmed(),
                reason
            ),
        }
    }

    fs::write(output, template)?;
    println!(
        "\n{} {}/{} mappings applied, saved to {}",
        "Done!".green().bold(),
        report.applied_count(),
        report.outcomes.len(),
        output.display()
    );

    Ok(())
}

fn cmd_schema(mappings: &Path, compact: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_mappings(mappings)?;
    let fields = docxmap::mapping::derive(registry.as_slice());
    println!("{}", value_to_json(&fields, json_format(compact))?);
    Ok(())
}

fn cmd_render(
    template: &Path,
    mappings: &Path,
    data: &Path,
    output: &Path,
    pdf: bool,
    soffice: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_mappings(mappings)?;
    let payload: Value = serde_json::from_str(&fs::read_to_string(data)?)?;
    let payload: Map<String, Value> = match payload {
        Value::Object(map) => map,
        _ => return Err("data must be a JSON object".into()),
    };
    let template_bytes = fs::read(template)?;

    let mut convert_options = ConvertOptions::new();
    if let Some(program) = soffice {
        convert_options = convert_options.with_program(program);
    }
    let converter = LibreOfficeConverter::new(convert_options);
    if pdf {
        log::debug!("PDF conversion with {}", converter.name());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(if pdf {
        "Rendering and converting..."
    } else {
        "Rendering..."
    });

    let rendered = render::render(
        &template_bytes,
        registry.as_slice(),
        &payload,
        &PlaceholderEngine::new(),
        Some(&converter as &dyn DocumentConverter),
        &RenderOptions::new().with_pdf(pdf),
    )?;
    spinner.finish_and_clear();

    fs::write(output, &rendered.docx)?;
    println!("{} {}", "Saved to".green(), output.display());

    if let Some(ref pdf_bytes) = rendered.pdf {
        let pdf_path = output.with_extension("pdf");
        fs::write(&pdf_path, pdf_bytes)?;
        println!("{} {}", "Saved to".green(), pdf_path.display());
    }

    if rendered.status == RenderStatus::DocxOnly {
        println!(
            "{}: {}",
            "PDF skipped".yellow(),
            rendered.conversion_error.as_deref().unwrap_or("unknown error")
        );
    }

    let stats = &rendered.stats;
    println!(
        "{} {} placeholder(s), {} loop(s), {} row(s)",
        "Filled".dimmed(),
        stats.placeholders_resolved,
        stats.loops_expanded,
        stats.rows_inserted
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docxmap".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX template tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docxmap".dimmed());
    println!("License: MIT");
}
