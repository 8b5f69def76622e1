//! xmlgen CLI - Generate FOXML ingest records from a CSV inventory
//!
//! # Main Commands
//!
//! ```bash
//! xmlgen generate reels.csv --pids pids.xml              # Multi-row input, saved PIDs
//! xmlgen generate reels.csv -a S --server stage          # Single-row input, live PIDs
//! xmlgen fetch-pids 40 --server stage --save pids.xml    # Reserve PIDs for later
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! xmlgen parse reels.csv           # Print parsed rows as JSON
//! xmlgen plan reels.csv            # How many PIDs a batch needs
//! xmlgen pids pids.xml             # List PIDs in a saved response
//! xmlgen date "1960-1965" range    # Render date markup
//! xmlgen duration 01:02:30         # Convert a duration to minutes
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use xmlgen::{
    date_markup, duration_literal, format_delimiter, generate, load_pid_file,
    parse_csv_file_auto, parse_pid_response, plan, write_batch, ArrangementMode,
    DirectorySink, GenerateOptions, MemorySink, PidClient,
    RegistryServer, TemplateSet, DEFAULT_LINK_BASE,
};
use xmlgen::identifiers::DEFAULT_NAMESPACE;
use xmlgen::transform::DEFAULT_DISCRIMINATOR;

#[derive(Parser)]
#[command(name = "xmlgen")]
#[command(about = "Generate UMDM/UMAM FOXML records from a CSV inventory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: CSV → FOXML documents + summary lists
    Generate {
        /// Input CSV file
        input: PathBuf,

        /// Row arrangement: S (one row per reel) or M (UMDM/UMAM rows)
        #[arg(short, long, default_value = "M")]
        arrangement: ArrangementMode,

        /// Saved registry response (or one PID per line)
        #[arg(short, long, conflicts_with = "server")]
        pids: Option<PathBuf>,

        /// Reserve PIDs live on this server (stage or production)
        #[arg(short, long)]
        server: Option<RegistryServer>,

        /// Save the registry response when using --server
        #[arg(long, requires = "server")]
        save_pids: Option<PathBuf>,

        /// Directory holding umdm.xml, umam.xml and the mets templates
        #[arg(short, long, default_value = ".")]
        templates: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Column holding UMDM/UMAM in multi-row input
        #[arg(long, default_value = DEFAULT_DISCRIMINATOR)]
        discriminator: String,

        /// Prefix of parent links in links.txt
        #[arg(long, default_value = DEFAULT_LINK_BASE)]
        link_base: String,

        /// Run everything but write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how many PIDs a CSV file needs
    Plan {
        /// Input CSV file
        input: PathBuf,

        /// Row arrangement: S or M
        #[arg(short, long, default_value = "M")]
        arrangement: ArrangementMode,

        /// Column holding UMDM/UMAM in multi-row input
        #[arg(long, default_value = DEFAULT_DISCRIMINATOR)]
        discriminator: String,
    },

    /// List the PIDs in a saved registry response
    Pids {
        /// PID file
        file: PathBuf,
    },

    /// Reserve PIDs on the registry
    FetchPids {
        /// Number of PIDs
        count: usize,

        /// stage or production
        #[arg(short, long, default_value = "stage")]
        server: RegistryServer,

        /// Save the raw response (default: stdout)
        #[arg(long)]
        save: Option<PathBuf>,

        /// PID namespace
        #[arg(long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },

    /// Render date markup for a value
    Date {
        /// Date value, e.g. "1960-1965" or "1960;1962"
        value: String,

        /// Attribute flags, e.g. "multiple circa range"
        #[arg(default_value = "")]
        attributes: String,
    },

    /// Convert HH:MM:SS to decimal minutes
    Duration {
        /// Duration value
        value: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input,
            arrangement,
            pids,
            server,
            save_pids,
            templates,
            output,
            discriminator,
            link_base,
            dry_run,
        } => {
            let options = GenerateOptions {
                arrangement,
                discriminator,
                link_base,
                ..GenerateOptions::default()
            };
            let source = match (pids, server) {
                (Some(path), _) => PidSource::File(path),
                (None, Some(server)) => PidSource::Registry(server, save_pids),
                (None, None) => PidSource::Missing,
            };
            cmd_generate(&input, source, &templates, &output, &options, dry_run).await
        }

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Plan {
            input,
            arrangement,
            discriminator,
        } => cmd_plan(&input, arrangement, &discriminator),

        Commands::Pids { file } => cmd_pids(&file),

        Commands::FetchPids {
            count,
            server,
            save,
            namespace,
        } => cmd_fetch_pids(count, server, save.as_deref(), &namespace).await,

        Commands::Date { value, attributes } => cmd_date(&value, &attributes),

        Commands::Duration { value } => cmd_duration(&value),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Where `generate` takes its PIDs from
enum PidSource {
    File(PathBuf),
    Registry(RegistryServer, Option<PathBuf>),
    Missing,
}

async fn cmd_generate(
    input: &Path,
    source: PidSource,
    templates_dir: &Path,
    output_dir: &Path,
    options: &GenerateOptions,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    // Templates first: a missing one should fail before PIDs are reserved
    let templates = TemplateSet::load_dir(templates_dir, &options.templates)?;

    let parsed = parse_csv_file_auto(input)?;
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(parsed.delimiter));
    eprintln!("   Rows: {}", parsed.rows.len());

    let batch = plan(&parsed.rows, options.arrangement, &options.discriminator)?;
    eprintln!(
        "   {} group(s), {} part(s), {} PIDs needed",
        batch.groups, batch.parts, batch.identifiers_required
    );

    let identifiers = match source {
        PidSource::File(path) => load_pid_file(&path)?,
        PidSource::Registry(server, save) => {
            let response = PidClient::from_env(server)?
                .fetch(batch.identifiers_required)
                .await?;
            if let Some(path) = save {
                fs::write(&path, &response.raw)?;
                eprintln!("   💾 PID response saved to: {}", path.display());
            }
            response.identifiers
        }
        PidSource::Missing => return Err("either --pids or --server is required".into()),
    };

    let result = generate(&parsed.rows, identifiers, &templates, options)?;

    if !result.diagnostics.is_empty() {
        eprintln!("\n⚠️  {} document(s) with unbound placeholders:", result.diagnostics.len());
        for diagnostic in result.diagnostics.iter().take(10) {
            eprintln!("   - {}", diagnostic);
        }
    }

    let written = if dry_run {
        let mut sink = MemorySink::new();
        write_batch(&result, &mut sink)?;
        eprintln!("\n🔍 Dry run: {} documents not written", sink.documents.len());
        0
    } else {
        write_batch(&result, &mut DirectorySink::new(output_dir))?
    };

    if written > 0 {
        eprintln!("   💾 Output written to: {}", output_dir.display());
    }
    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_plan(
    input: &Path,
    arrangement: ArrangementMode,
    discriminator: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_csv_file_auto(input)?;
    let batch = plan(&parsed.rows, arrangement, discriminator)?;

    eprintln!("📋 {} ({} mode)", input.display(), arrangement.to_code());
    eprintln!("   Groups: {}", batch.groups);
    eprintln!("   Parts: {}", batch.parts);
    println!("{}", batch.identifiers_required);
    Ok(())
}

fn cmd_pids(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let identifiers = load_pid_file(file)?;
    for id in &identifiers {
        println!("{}", id);
    }
    Ok(())
}

async fn cmd_fetch_pids(
    count: usize,
    server: RegistryServer,
    save: Option<&Path>,
    namespace: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = PidClient::from_env(server)?
        .with_namespace(namespace)
        .fetch(count)
        .await?;

    match save {
        Some(path) => {
            fs::write(path, &response.raw)?;
            // Read back to make sure the saved file is usable with --pids
            let reread = parse_pid_response(&fs::read_to_string(path)?);
            eprintln!("💾 {} PIDs saved to: {}", reread.len(), path.display());
        }
        None => {
            for id in &response.identifiers {
                println!("{}", id);
            }
        }
    }
    Ok(())
}

fn cmd_date(value: &str, attributes: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", date_markup(value, attributes)?);
    Ok(())
}

fn cmd_duration(value: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", duration_literal(value)?);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
