use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hexmap_render::colors::ColorMode;
use hexmap_render::error::HexmapError;
use hexmap_render::font::{DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE};
use hexmap_render::geometry::{HexMetrics, DEFAULT_SIDE_LENGTH};
use hexmap_render::grid::{GridModel, Hex, HexGrid, MAX_GRID_SIZE};
use hexmap_render::render::{HexMapRenderer, RenderConfig};
use hexmap_render::synthetic::{generate_grid, SyntheticParams};

#[derive(Parser, Debug)]
#[command(name = "hexmap_render")]
#[command(about = "Render hex grid maps to PNG for debugging")]
struct Args {
    /// Grid document to render (JSON)
    #[arg(short, long, conflicts_with = "synthetic")]
    grid: Option<PathBuf>,

    /// Generate a synthetic grid of this size instead of loading one
    #[arg(long)]
    synthetic: Option<usize>,

    /// Random seed for the synthetic grid (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write the grid document used for rendering to this path
    #[arg(long)]
    save_grid: Option<PathBuf>,

    /// Output image path (with --all-modes, the prefix for one image per mode)
    #[arg(short, long, default_value = "hexmap.png")]
    output: PathBuf,

    /// Map name used in log output
    #[arg(long, default_value = "hexmap")]
    name: String,

    /// Which cell attribute drives the fill colour
    #[arg(short, long, value_enum, default_value = "terrain")]
    color: ColorMode,

    /// Render one image per colour mode
    #[arg(long)]
    all_modes: bool,

    /// Draw river segments
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    rivers: bool,

    /// Annotate cells with altitude, coordinates, moisture and temperature
    #[arg(long)]
    numbers: bool,

    /// Draw coastlines (needs a grid with a hydrosphere)
    #[arg(long)]
    coasts: bool,

    /// Draw territory borders
    #[arg(long)]
    borders: bool,

    /// Label owned cells with their territory id (shown with --numbers)
    #[arg(long)]
    territory_labels: bool,

    /// Hexagon side length in pixels
    #[arg(long, default_value_t = DEFAULT_SIDE_LENGTH)]
    side_length: i32,

    /// TrueType font for labels
    #[arg(long, default_value = DEFAULT_FONT_PATH)]
    font: PathBuf,

    /// Label font size in pixels
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: f32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if args.side_length < 2 {
        return Err(format!("side length must be at least 2, got {}", args.side_length).into());
    }

    let grid = load_or_generate(&args)?;
    let land = grid.iter().filter(|hex| hex.is_land()).count();
    let cells = grid.size() * grid.size();
    println!(
        "Grid: {}x{} cells, {} land ({:.1}%)",
        grid.size(),
        grid.size(),
        land,
        if cells > 0 { 100.0 * land as f64 / cells as f64 } else { 0.0 }
    );

    if let Some(path) = &args.save_grid {
        grid.save(path)?;
        println!("Saved grid document to {}", path.display());
    }

    if args.all_modes {
        for &mode in ColorMode::all() {
            let path = mode_path(&args.output, mode);
            render_one(&grid, &args, mode, &path)?;
        }
    } else {
        render_one(&grid, &args, args.color, &args.output)?;
    }

    Ok(())
}

fn load_or_generate(args: &Args) -> Result<HexGrid, Box<dyn Error>> {
    if let Some(path) = &args.grid {
        println!("Loading grid from {}...", path.display());
        return Ok(HexGrid::load(path)?);
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let size = args.synthetic.unwrap_or(SyntheticParams::default().size);
    if size > MAX_GRID_SIZE {
        return Err(HexmapError::GridTooLarge {
            size,
            max: MAX_GRID_SIZE,
        }
        .into());
    }
    println!("Generating synthetic {}x{} grid with seed: {}", size, size, seed);
    Ok(generate_grid(&SyntheticParams {
        size,
        seed,
        ..SyntheticParams::default()
    }))
}

fn render_one(grid: &HexGrid, args: &Args, mode: ColorMode, path: &Path) -> Result<(), Box<dyn Error>> {
    println!("Rendering {} map to {}...", mode.name(), path.display());

    let mut config = RenderConfig::new(format!("{} {}", args.name, mode.name()), mode.classifier())
        .rivers(args.rivers)
        .numbers(args.numbers)
        .show_coasts(args.coasts)
        .borders(args.borders)
        .metrics(HexMetrics::from_side_length(args.side_length))
        .font(args.font.clone(), args.font_size);
    if args.territory_labels {
        config = config.text_func(territory_label);
    }

    HexMapRenderer::new(grid, config)?.save(path)?;
    Ok(())
}

fn territory_label(hex: &Hex) -> String {
    hex.territory.map(|id| format!("#{}", id.0)).unwrap_or_default()
}

/// `maps/world.png` + altitude -> `maps/world_altitude.png`
fn mode_path(output: &Path, mode: ColorMode) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hexmap".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output.with_file_name(format!("{}_{}.{}", stem, mode.name(), ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_path() {
        assert_eq!(
            mode_path(Path::new("maps/world.png"), ColorMode::Altitude),
            PathBuf::from("maps/world_altitude.png")
        );
        assert_eq!(
            mode_path(Path::new("out"), ColorMode::Territory),
            PathBuf::from("out_territory.png")
        );
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["hexmap_render"]);
        assert!(args.rivers);
        assert!(!args.numbers);
        assert_eq!(args.color, ColorMode::Terrain);
        assert_eq!(args.side_length, DEFAULT_SIDE_LENGTH);

        let args = Args::parse_from(["hexmap_render", "--rivers", "false", "--color", "moisture"]);
        assert!(!args.rivers);
        assert_eq!(args.color, ColorMode::Moisture);
    }

    #[test]
    fn test_grid_conflicts_with_synthetic() {
        assert!(Args::try_parse_from(["hexmap_render", "--grid", "a.json", "--synthetic", "8"]).is_err());
    }
}
