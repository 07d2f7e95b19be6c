use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde_json::Value;

use crate::utils::write_json;

mod merge;
mod table;

/// Looked for in the working directory when no CSV is given.
const DEFAULT_CSV_FILES: [&str; 4] = [
    "stores.csv",
    "coordinates.csv",
    "store_coordinates.csv",
    "data.csv",
];

#[derive(Debug, clap::Args)]
pub struct CoordinateArgs {
    /// CSV with a store number column and latitude/longitude columns
    csv: Option<PathBuf>,
    /// Comparison file to patch in place
    #[arg(long, default_value = "store_comparison_results.json")]
    json: PathBuf,
}

pub fn main(args: CoordinateArgs) -> Result<()> {
    println!("Reading {}...", args.json.display());
    let mut data: Value = serde_json::from_str(
        &fs::read_to_string(&args.json)
            .with_context(|| format!("Failed to read {}", args.json.display()))?,
    )
    .with_context(|| format!("Failed to parse {}", args.json.display()))?;

    let csv = match args.csv {
        Some(x) => x,
        None => find_default_csv(Path::new(".")).with_context(|| {
            format!(
                "No CSV file given and none of {} found",
                DEFAULT_CSV_FILES.iter().join(", ")
            )
        })?,
    };

    println!("Reading coordinates from {}...", csv.display());
    let coords = table::load(&csv)?;
    println!("Loaded {} stores from CSV", coords.len());

    let report = merge::apply(&mut data, &coords)?;

    println!("Updating {}...", args.json.display());
    write_json(&args.json, &data)?;

    println!("Updated {} stores with coordinates", report.updated);
    println!(
        "Stores in CSV but not found in JSON: {}",
        report.unused.len()
    );

    Ok(())
}

fn find_default_csv(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CSV_FILES
        .iter()
        .map(|x| dir.join(x))
        .find(|x| x.exists())
}
