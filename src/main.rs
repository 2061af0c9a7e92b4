//! smbx-tileset command line
//!
//! Usage:
//!   smbx-tileset export castle.png            # Allocate IDs and export every tile
//!   smbx-tileset allocate castle.png          # Show the IDs an export would use
//!   smbx-tileset ids "1-3;37;48-50"           # Expand a range spec

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use smbx_tileset::config::Config;
use smbx_tileset::ids::RangeSpec;
use smbx_tileset::project::Project;
use smbx_tileset::tile::Category;

#[derive(Parser)]
#[command(name = "smbx-tileset")]
#[command(version = smbx_tileset::VERSION)]
#[command(about = "Cut a tileset image into SMBX2 blocks and BGOs")]
struct Cli {
    /// Log every allocation decision and exported tile
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate IDs and export every tile of a tileset
    Export {
        /// Tileset image
        image: PathBuf,
        /// Project file (defaults to the image path with a .json extension)
        #[arg(long)]
        project: Option<PathBuf>,
        /// Output directory (defaults to the config's, then the image's directory)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        pixel_scale: Option<u32>,
        /// Range spec or preset for block IDs
        #[arg(long)]
        block_ids: Option<String>,
        /// Range spec or preset for BGO IDs
        #[arg(long)]
        bgo_ids: Option<String>,
        /// Hand out automatic IDs from the top of the range down
        #[arg(long)]
        start_high: bool,
        /// Skip the PGE tileset files
        #[arg(long)]
        no_pge_tileset: bool,
    },
    /// Expand or check a range spec
    Ids {
        /// Range spec or preset name ("Avoid Special", "User Slots")
        spec: String,
        #[arg(long, value_enum, default_value_t = CategoryArg::Block)]
        category: CategoryArg,
        /// Only report whether the spec is valid and how many IDs it covers
        #[arg(long)]
        check: bool,
    },
    /// Print the IDs an export would assign, without writing anything
    Allocate {
        /// Tileset image
        image: PathBuf,
        /// Project file (defaults to the image path with a .json extension)
        #[arg(long)]
        project: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Block,
    Bgo,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Block => Category::Block,
            CategoryArg::Bgo => Category::Bgo,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    match cli.command {
        Commands::Export {
            image,
            project,
            out,
            pixel_scale,
            block_ids,
            bgo_ids,
            start_high,
            no_pge_tileset,
        } => {
            let project_path = project.unwrap_or_else(|| Project::path_for_image(&image));
            let mut project = Project::load_or_new(&project_path, &config.export_settings())
                .with_context(|| format!("Failed to load project {}", project_path.display()))?;

            if let Some(scale) = pixel_scale {
                project
                    .set_pixel_scale(scale)
                    .with_context(|| format!("Failed to change pixel scale to {}", scale))?;
            }
            let settings = &mut project.settings;
            if let Some(spec) = block_ids {
                settings.block_ids = spec;
            }
            if let Some(spec) = bgo_ids {
                settings.bgo_ids = spec;
            }
            settings.start_high |= start_high;
            if no_pge_tileset {
                settings.create_pge_tileset = false;
            }

            let out_dir = out
                .or_else(|| config.output_dir.clone())
                .unwrap_or_else(|| image_dir(&image));
            export(&image, &project_path, &out_dir, &mut project)
        }
        Commands::Ids { spec, category, check } => print_ids(&spec, category.into(), check),
        Commands::Allocate { image, project } => {
            let project_path = project.unwrap_or_else(|| Project::path_for_image(&image));
            let mut project = Project::load(&project_path)
                .with_context(|| format!("Failed to load project {}", project_path.display()))?;
            print_allocation(&mut project)
        }
    }
}

/// Directory holding the tileset image
fn image_dir(image: &Path) -> PathBuf {
    image
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn export(image_path: &Path, project_path: &Path, out_dir: &Path, project: &mut Project) -> Result<()> {
    let image = image::open(image_path)
        .with_context(|| format!("Failed to open tileset image {}", image_path.display()))?
        .to_rgba8();
    let name = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("tileset");

    let summary = project
        .export(&image, out_dir, name)
        .context("Export failed")?;
    project
        .save(project_path)
        .with_context(|| format!("Failed to save project {}", project_path.display()))?;

    info!(
        "Exported {} blocks and {} BGOs to {}",
        summary.blocks,
        summary.bgos,
        out_dir.display()
    );
    Ok(())
}

fn print_ids(text: &str, category: Category, check: bool) -> Result<()> {
    let spec = RangeSpec::parse(text, category)
        .with_context(|| format!("Invalid {} ID spec '{}'", category, text))?;
    if check {
        println!("valid: {} IDs ({})", spec.len(), spec);
    } else {
        for id in spec.iter() {
            println!("{}", id);
        }
    }
    Ok(())
}

fn print_allocation(project: &mut Project) -> Result<()> {
    let plans = project.plan_allocation().context("Allocation failed")?;
    for plan in &plans {
        let tiles = project.tiles.iter().filter(|t| t.category() == plan.category);
        for (tile, id) in tiles.zip(&plan.ids) {
            let source = if tile.manual_id().is_some() {
                "manual"
            } else if tile.assigned_id().is_some() {
                "kept"
            } else {
                "new"
            };
            println!("{:<5} {:>5}  {:<7} {}", plan.category.label(), id, source, tile.bounds);
        }
    }
    Ok(())
}
