#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the KMZ generator.
//!
//! Reads a seed workbook (`.xlsx`/`.xls`/`.ods`, or a directory of `.csv`
//! files named after the sheets), builds the KMZ overlay and writes it to
//! disk. `preview` shows what was recognized in a workbook and `inspect`
//! prints the KML inside an existing archive.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use kmz_builder::BuildOptions;
use kmz_sheet_models::SheetKind;

const DEFAULT_OUTPUT: &str = "KMZ_Generator_Output.kmz";

#[derive(Parser)]
#[command(name = "kmz_cli", about = "Seed workbook to KMZ overlay generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a KMZ from a seed workbook
    Generate {
        /// Workbook file or directory of CSV sheets
        #[arg(long)]
        input: PathBuf,

        /// Output archive path
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// TOML file with build options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Split paths at jumps longer than the split distance
        #[arg(long)]
        auto_split: bool,

        /// Split distance in meters (implies `--auto-split`)
        #[arg(long)]
        split_distance: Option<f64>,

        /// Hide Notes labels until hover when the sheet has no
        /// `HideNameUntilMouseOver` column
        #[arg(long)]
        hide_notes: bool,

        /// Print the icon href used for every Notes row
        #[arg(long)]
        debug_notes: bool,
    },
    /// List the recognized sheets of a workbook
    Preview {
        /// Workbook file or directory of CSV sheets
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the KML inside an existing KMZ
    Inspect {
        /// KMZ archive to read
        #[arg(long)]
        kmz: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            config,
            auto_split,
            split_distance,
            hide_notes,
            debug_notes,
        } => {
            let mut options = match &config {
                Some(path) => BuildOptions::load(path)?,
                None => BuildOptions::default(),
            };
            if auto_split {
                options.geometry.auto_split = true;
            }
            if let Some(distance) = split_distance {
                options.geometry.auto_split = true;
                options.geometry.split_distance_m = distance;
            }
            if hide_notes {
                options.notes.hidden_by_default = true;
            }
            generate(&input, &output, &options, debug_notes)?;
        }
        Commands::Preview { input } => preview(&input)?,
        Commands::Inspect { kmz } => inspect(&kmz)?,
    }

    Ok(())
}

fn generate(
    input: &Path,
    output: &Path,
    options: &BuildOptions,
    debug_notes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let workbook = kmz_sheet::load_workbook(input)?;
    if workbook.populated_kinds().is_empty() {
        log::warn!(
            "No AGMs, Access, Centerline or Notes sheet found in {}",
            input.display()
        );
    }

    let generated = kmz_builder::generate(&workbook, options)?;

    if debug_notes {
        if generated.report.notes.is_empty() {
            println!("No Notes rows.");
        } else {
            print!("{}", generated.report.notes_table());
        }
    }
    for note in generated.report.notes_without_icon() {
        log::warn!("Note {:?} has no icon href", note.name);
    }

    std::fs::write(output, &generated.bytes)?;

    for folder in &generated.report.folders {
        println!(
            "{:<12} {:>5} rows  {:>5} points  {:>4} paths  {:>4} skipped",
            folder.name, folder.rows, folder.points, folder.paths, folder.skipped_rows
        );
    }
    println!(
        "Wrote {} ({} bytes, {} Notes style maps)",
        output.display(),
        generated.bytes.len(),
        generated.report.style_maps
    );
    Ok(())
}

fn preview(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let workbook = kmz_sheet::load_workbook(input)?;

    for &kind in SheetKind::ALL {
        match workbook.sheet(kind) {
            Some(sheet) if !sheet.is_empty() => {
                println!(
                    "{kind} (sheet '{}'): {} rows",
                    sheet.name,
                    sheet.rows.len()
                );
                println!("  columns: {}", sheet.columns.join(", "));
            }
            _ => println!("{kind}: not found"),
        }
    }
    Ok(())
}

fn inspect(kmz: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(kmz)?;
    let entries = kmz_kml::archive::entry_names(&bytes)?;
    log::info!("{} entries: {}", kmz.display(), entries.join(", "));
    let kml = kmz_kml::archive::read_kml(&bytes)?;
    print!("{kml}");
    Ok(())
}
