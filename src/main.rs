//! Charapng CLI - Command-line tool for character cards embedded in PNG files.
//!
//! This is the main entry point for the charapng command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use charapng::card::{split_lines, split_tags};
use charapng::prelude::*;

/// Charapng - character card reader and writer for PNG images
#[derive(Parser)]
#[command(name = "charapng")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace root holding Character_Cards and World_Books
    #[arg(short, long, global = true, env = "CHARAPNG_WORKSPACE", default_value = ".")]
    workspace: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the card format and a field summary of PNG files
    Inspect {
        /// PNG files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract the character record of a card as JSON
    Extract {
        /// Input card PNG
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Embed a JSON character record into a PNG
    Embed {
        /// Target PNG
        #[arg(short, long)]
        input: PathBuf,

        /// Character record JSON file
        #[arg(short, long)]
        json: PathBuf,

        /// Write to a new file instead of modifying the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a new card in the workspace from an image
    Create {
        /// Source PNG image
        #[arg(long)]
        image: PathBuf,

        /// Character name
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        personality: Option<String>,

        #[arg(long)]
        scenario: Option<String>,

        /// First message
        #[arg(long)]
        first_mes: Option<String>,

        /// Example dialogue
        #[arg(long)]
        mes_example: Option<String>,

        #[arg(long)]
        system_prompt: Option<String>,

        #[arg(long)]
        creator: Option<String>,

        #[arg(long)]
        creator_notes: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Alternate greetings, one per line
        #[arg(long)]
        alternate_greetings: Option<String>,
    },

    /// Export the world book of a card as JSON
    BookExport {
        /// Input card PNG
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to the workspace World_Books)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode every PNG under a directory
    Scan {
        /// Directory to scan (defaults to the workspace Character_Cards)
        dir: Option<PathBuf>,
    },

    /// Copy cards to a directory, named after their characters
    Export {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Card files to export
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let workspace = CardWorkspace::new(&cli.workspace);

    match cli.command {
        Commands::Inspect { files } => {
            cmd_inspect(&files);
        }
        Commands::Extract { input, output } => {
            cmd_extract(&input, output.as_deref())?;
        }
        Commands::Embed { input, json, output } => {
            cmd_embed(&input, &json, output.as_deref())?;
        }
        Commands::Create {
            image,
            name,
            description,
            personality,
            scenario,
            first_mes,
            mes_example,
            system_prompt,
            creator,
            creator_notes,
            tags,
            alternate_greetings,
        } => {
            let data = CardData {
                name: Some(name),
                description: Some(description.unwrap_or_default()),
                personality: Some(personality.unwrap_or_default()),
                scenario: Some(scenario.unwrap_or_default()),
                first_mes: Some(first_mes.unwrap_or_default()),
                mes_example: Some(mes_example.unwrap_or_default()),
                system_prompt: Some(system_prompt.unwrap_or_default()),
                creator: Some(creator.unwrap_or_default()),
                creator_notes: Some(creator_notes.unwrap_or_default()),
                tags: Some(tags.as_deref().map(split_tags).unwrap_or_default()),
                alternate_greetings: Some(
                    alternate_greetings
                        .as_deref()
                        .map(split_lines)
                        .unwrap_or_default(),
                ),
                ..Default::default()
            };
            cmd_create(&workspace, &image, data)?;
        }
        Commands::BookExport { input, output } => {
            let dir = output.unwrap_or_else(|| workspace.books_dir());
            cmd_book_export(&input, &dir)?;
        }
        Commands::Scan { dir } => {
            let dir = dir.unwrap_or_else(|| workspace.cards_dir());
            cmd_scan(&dir)?;
        }
        Commands::Export { output, files } => {
            cmd_export(&files, &output)?;
        }
    }

    Ok(())
}

/// Decode a file, turning the non-card outcomes into errors.
fn load_card(path: &Path) -> Result<DecodedCard> {
    match decode_file(path) {
        DecodeOutcome::Card(card) => Ok(card),
        DecodeOutcome::NoData => anyhow::bail!("{} holds no character data", path.display()),
        DecodeOutcome::InvalidImage(reason) => {
            anyhow::bail!("{} is not a readable PNG: {}", path.display(), reason)
        }
    }
}

fn cmd_inspect(files: &[PathBuf]) {
    for path in files {
        println!("{}", path.display());

        let card = match decode_file(path) {
            DecodeOutcome::Card(card) => card,
            other => {
                println!("  {}", other.label());
                if let DecodeOutcome::InvalidImage(reason) = other {
                    println!("  {}", reason);
                }
                continue;
            }
        };

        let record = &card.record;
        println!("  Format:  {}", card.variant);
        println!("  Name:    {}", record.display_name());
        if record.is_read_only() {
            println!("  (read-only: Stable Diffusion parameters)");
        }

        if let Some(data) = &record.data {
            let len = |field: &Option<String>| field.as_deref().map_or(0, str::len);
            println!(
                "  Fields:  description {} chars, personality {} chars, first message {} chars",
                len(&data.description),
                len(&data.personality),
                len(&data.first_mes)
            );
            if let Some(tags) = data.tags.as_ref().filter(|t| !t.is_empty()) {
                println!("  Tags:    {}", tags.join(", "));
            }
            if let Some(greetings) = &data.alternate_greetings {
                println!("  Alternate greetings: {}", greetings.len());
            }
        }

        if let Some(book) = record.character_book() {
            println!(
                "  World book: {} ({} entries)",
                book.name.as_deref().unwrap_or("unnamed"),
                book.entries.len()
            );
        }
    }
}

fn cmd_extract(input: &Path, output: Option<&Path>) -> Result<()> {
    let card = load_card(input)?;
    let json = to_pretty_json(&card.record).context("Failed to serialize record")?;

    match output {
        Some(output) => {
            fs::write(output, json).context("Failed to write output file")?;
            println!(
                "Extracted {} ({}) to {}",
                card.record.display_name(),
                card.variant,
                output.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn cmd_embed(input: &Path, json: &Path, output: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(json).context("Failed to read record JSON")?;
    let record: CharacterRecord =
        serde_json::from_str(&text).context("Failed to parse record JSON")?;

    match output {
        Some(output) => {
            export_card(input, output, &record).context("Failed to export card")?;
            println!("Wrote {} to {}", record.display_name(), output.display());
        }
        None => {
            write_card(input, &record).context("Failed to write card")?;
            println!("Wrote {} to {}", record.display_name(), input.display());
        }
    }

    Ok(())
}

fn cmd_create(workspace: &CardWorkspace, image: &Path, data: CardData) -> Result<()> {
    let path = workspace
        .create_card(image, data)
        .context("Failed to create card")?;

    println!("Created card: {}", path.display());

    Ok(())
}

fn cmd_book_export(input: &Path, dir: &Path) -> Result<()> {
    let card = load_card(input)?;
    let path = export_book(&card.record, dir).context("Failed to export world book")?;

    println!("World book written to {}", path.display());

    Ok(())
}

fn cmd_scan(dir: &Path) -> Result<()> {
    println!("Scanning: {}", dir.display());

    let paths = collect_pngs(dir);
    if paths.is_empty() {
        println!("No PNG files found");
        return Ok(());
    }

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let entries = scan_cards(&paths, |done, _| pb.set_position(done as u64));
    pb.finish_and_clear();

    for entry in &entries {
        let format = match &entry.outcome {
            DecodeOutcome::Card(card) => card.variant.label(),
            _ => "-",
        };
        println!("{:<18} {:<32} {}", format, entry.display_name(), entry.path.display());
    }

    let cards = entries.iter().filter(|e| e.is_card()).count();
    println!(
        "\n{} cards in {} files ({:?})",
        cards,
        entries.len(),
        start.elapsed()
    );

    Ok(())
}

fn cmd_export(files: &[PathBuf], output: &Path) -> Result<()> {
    println!("Exporting {} files to {}...", files.len(), output.display());

    let start = Instant::now();
    let stats = export_cards(files, output).context("Failed to export cards")?;

    println!(
        "Exported {} cards in {:?} ({} errors)",
        stats.exported,
        start.elapsed(),
        stats.errors
    );

    if !stats.is_complete() {
        anyhow::bail!("{} of {} files could not be exported", stats.errors, stats.total);
    }

    Ok(())
}
