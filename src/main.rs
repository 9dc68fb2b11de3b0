//! # Stickersheet CLI
//!
//! Command-line interface for composing photo stickers and printing sheets.
//!
//! ## Usage
//!
//! ```bash
//! # List the templates in resources/templates.json
//! stickersheet templates
//!
//! # Compose one sticker to PNG
//! stickersheet compose --image cat.jpg --logo ESPuino --caption Kitchen --out cat.png
//!
//! # Build a whole sheet from a job file
//! stickersheet build sheet.json --out sheet.pdf
//!
//! # Write every page as PNG instead (sheet-1.png, sheet-2.png, ...)
//! stickersheet build sheet.json --out sheet.png
//!
//! # Low-resolution overview of a sheet with cell outlines
//! stickersheet preview --job sheet.json --out overview.png
//! ```
//!
//! Set `RUST_LOG=debug` for more detail.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use stickersheet::{
    GridCoordinate, LabelStyle, LogoChoice, ResourcePaths, Resources, Session, SheetError,
    export,
    geometry::{cell_size, px_to_mm},
    job::Job,
    render::caption::find_system_font,
    render::compose::{self, DEFAULT_BLUR, PREVIEW_SIZE},
    source,
};

/// Stickersheet - photo sticker sheet composer
#[derive(Parser, Debug)]
#[command(name = "stickersheet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Resource directory (templates.json and logo artwork)
    #[arg(long, global = true, default_value = "resources", value_name = "DIR")]
    resources: PathBuf,

    /// Caption font (defaults to <resources>/fonts/caption.ttf)
    #[arg(long, global = true, value_name = "FILE")]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available templates
    Templates {
        /// Show pixel sizes at this resolution
        #[arg(long, default_value = "300")]
        dpi: u32,
    },

    /// Compose a single sticker to PNG
    Compose {
        /// Template whose sticker size to use (defaults to the first one)
        #[arg(long)]
        template: Option<String>,

        /// Source photo
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// Background blur radius (0-100)
        #[arg(long, default_value_t = DEFAULT_BLUR)]
        blur: u8,

        /// Logo: None, ESPuino or Tonuino
        #[arg(long, default_value = "None")]
        logo: LogoChoice,

        /// Caption text
        #[arg(long, default_value = "")]
        caption: String,

        /// Print resolution
        #[arg(long, default_value = "300")]
        dpi: u32,

        /// Write the 278x170 editor preview instead of the full sticker
        #[arg(long)]
        preview: bool,

        /// Output PNG
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Build a sheet from a JSON job file
    Build {
        /// Job file
        job: PathBuf,

        /// Output file: .pdf for one document, .png for one file per page
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// Print resolution (overrides the job's, default 300)
        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Write a low-resolution sheet overview with cell outlines
    Preview {
        /// Job file to show stickers from
        #[arg(long, value_name = "FILE")]
        job: Option<PathBuf>,

        /// Template to outline when no job is given (defaults to the first one)
        #[arg(long)]
        template: Option<String>,

        /// Overview resolution
        #[arg(long, default_value = "50")]
        dpi: u32,

        /// Output PNG
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

const DEFAULT_DPI: u32 = 300;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), SheetError> {
    let cli = Cli::parse();

    let mut paths = ResourcePaths::in_dir(&cli.resources);
    if let Some(font) = cli.font {
        paths = paths.with_font(font);
    } else if !paths.font.is_file()
        && let Some(system) = find_system_font()
    {
        info!(font = %system.display(), "no bundled caption font, using system font");
        paths = paths.with_font(system);
    }
    let resources = Resources::load(&paths)?;

    match cli.command {
        Commands::Templates { dpi } => {
            println!("Available templates:");
            for (name, descriptor) in resources.catalog.iter() {
                let cell = cell_size(descriptor, dpi);
                println!(
                    "  {:<28} {}x{} stickers, {}x{} mm ({}x{} px at {} dpi, prints {:.2}x{:.2} mm)",
                    name,
                    descriptor.pattern.rows,
                    descriptor.pattern.columns,
                    descriptor.sticker_width_mm,
                    descriptor.sticker_height_mm,
                    cell.width,
                    cell.height,
                    dpi,
                    px_to_mm(cell.width, dpi),
                    px_to_mm(cell.height, dpi)
                );
            }
        }

        Commands::Compose {
            template,
            image,
            blur,
            logo,
            caption,
            dpi,
            preview,
            out,
        } => {
            let mut session = open_session(&resources, template.as_deref(), dpi)?;
            let cell = GridCoordinate::new(0, 0);
            session.set_source_image(cell, source::open(&image)?)?;
            session.set_style(cell, LabelStyle::new(blur, logo, caption))?;

            let sticker = session.compose_cell(cell)?;
            if preview {
                compose::preview(sticker, PREVIEW_SIZE).save(&out)?;
            } else {
                sticker.save(&out)?;
            }
            println!("Saved to {}", out.display());
        }

        Commands::Build { job, out, dpi } => {
            let (job, base) = Job::load(&job)?;
            let dpi = dpi.or(job.dpi).unwrap_or(DEFAULT_DPI);
            let mut session = job.into_session(&resources, Some(dpi), &base)?;

            let pages = session.assemble_pages()?;
            write_pages(&pages, dpi, &out)?;
            println!("Built {} page(s) from template '{}'", pages.len(), session.template_name());
        }

        Commands::Preview {
            job,
            template,
            dpi,
            out,
        } => {
            let overview = match job {
                Some(job) => {
                    let (job, base) = Job::load(&job)?;
                    let print_dpi = job.dpi.unwrap_or(DEFAULT_DPI);
                    let mut session = job.into_session(&resources, Some(print_dpi), &base)?;
                    for (coord, e) in session.compose_pending() {
                        eprintln!("Warning: label {} not shown: {}", coord, e);
                    }
                    session.overview(dpi)
                }
                None => open_session(&resources, template.as_deref(), dpi)?.overview(dpi),
            };
            overview.save(&out)?;
            println!("Saved to {}", out.display());
        }
    }

    Ok(())
}

fn open_session<'r>(
    resources: &'r Resources,
    template: Option<&str>,
    dpi: u32,
) -> Result<Session<'r>, SheetError> {
    match template {
        Some(name) => Session::with_template(resources, name, dpi),
        None => Session::new(resources, dpi),
    }
}

/// `.png` writes `<stem>-<n>.png` next to `out`; anything else is a PDF.
fn write_pages(pages: &[image::RgbaImage], dpi: u32, out: &Path) -> Result<(), SheetError> {
    let is_png = out
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));

    if is_png {
        let dir = out.parent().unwrap_or(Path::new(""));
        let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
        let stem = out.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
        for path in export::write_pngs(pages, dir, stem)? {
            info!(path = %path.display(), "page written");
        }
    } else {
        export::write_pdf(pages, dpi, out)?;
    }
    Ok(())
}
