use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use mercwarp::raster::read_png;
use mercwarp::{LatitudeExtent, RowIndexMap, Transparency};

/// Print the layout of a PNG and, given an extent, its Mercator row statistics
#[derive(Parser, Debug)]
#[command(name = "inspect_png")]
struct Args {
    /// PNG file to inspect
    file: PathBuf,

    /// Southern latitude of the last row
    #[arg(long, requires = "lat_max", allow_hyphen_values = true)]
    lat_min: Option<f64>,

    /// Northern latitude of the first row
    #[arg(long, requires = "lat_min", allow_hyphen_values = true)]
    lat_max: Option<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Inspecting PNG file: {}", args.file.display());
    let raster = read_png(&args.file)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    println!("\n=== RASTER ===");
    println!("  size       = {} x {}", raster.width(), raster.height());
    println!("  color mode = {}", raster.color_mode());
    println!("  bit depth  = {}", raster.bit_depth());
    println!("  lanes      = {}", raster.lanes());
    println!(
        "  memory     = {:.1} MB",
        raster.memory_usage() as f64 / 1_048_576.0
    );

    if let Some(palette) = raster.palette() {
        println!("\nPalette: {} entries", palette.len());
        for (index, rgb) in palette.entries().iter().take(8).enumerate() {
            println!("  {:3}: #{:02x}{:02x}{:02x}", index, rgb[0], rgb[1], rgb[2]);
        }
        if palette.len() > 8 {
            println!("  ...");
        }
    }

    match raster.transparency() {
        Some(Transparency::PaletteIndex(index)) => println!("\nTransparent index: {}", index),
        Some(Transparency::PaletteAlpha(alpha)) => {
            println!("\nPalette alpha table: {} entries", alpha.len())
        }
        Some(Transparency::ColorKey(key)) => println!("\nColour key: {:?}", key),
        None => println!("\nNo transparency"),
    }

    if let (Some(lat_min), Some(lat_max)) = (args.lat_min, args.lat_max) {
        let extent = LatitudeExtent::new(lat_min, lat_max)?;
        let map = RowIndexMap::build(&extent, raster.height())?;
        let stats = map.stats();
        let indices = map.indices();

        println!("\n=== MERCATOR ROW MAP ({}) ===", extent);
        println!("  duplicated rows = {}", stats.duplicated_rows);
        println!("  skipped rows    = {}", stats.skipped_rows);
        let samples = 5.min(indices.len());
        for step in 0..samples {
            let row = step * (indices.len() - 1) / (samples - 1).max(1);
            println!("  output row {:6} <- source row {:6}", row, indices[row]);
        }
    }

    Ok(())
}
