use std::{collections::BTreeSet, fs, path::PathBuf, thread::sleep, time::Duration};

use _model::{BrandTable, ComparisonEntry};
use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::{info, warn};
use ureq::AgentBuilder;

use crate::utils::{progress_bar, write_json};

use self::{
    database::{LogoDatabase, LogoEntry, Summary},
    families::BrandFamily,
    mudflap::Mudflap,
};

mod database;
mod download;
mod families;
mod mudflap;

const TOP_BRANDS: usize = 20;
const MAX_CHAINS_SHOWN: usize = 50;

#[derive(Debug, clap::Args)]
pub struct LogoArgs {
    /// Price comparison file to read stations from
    #[arg(long, default_value = "RRMudflapsPrices_2026-01-18_14-50-12.json")]
    stations: PathBuf,
    /// Directory logos and logo_database.json are written to
    #[arg(long, default_value = "mudflap_logos")]
    output: PathBuf,
    #[arg(long, default_value = mudflap::API_BASE)]
    api: String,
    /// Nearby search radius in miles
    #[arg(long, default_value_t = 150)]
    radius: u32,
    /// Seconds to wait after each nearby search
    #[arg(long, default_value_t = 0.5)]
    delay: f64,
    /// Seconds to wait after each download
    #[arg(long, default_value_t = 0.2)]
    download_delay: f64,
    /// Nearby search timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
    /// Download timeout in seconds
    #[arg(long, default_value_t = 15)]
    download_timeout: u64,
    /// YAML list of `{brand, aliases}` replacing the built-in brand table
    #[arg(long)]
    brands: Option<PathBuf>,
    /// Don't list the chain names seen in API responses
    #[arg(long)]
    hide_chains: bool,
}

#[derive(Debug, Default)]
struct Resolution {
    database: LogoDatabase,
    found: usize,
    not_found: usize,
    chains: BTreeSet<String>,
}

pub fn main(args: LogoArgs) -> Result<()> {
    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    info!(
        "Output directory {}, search radius {} miles",
        args.output.display(),
        args.radius
    );

    let brands = match &args.brands {
        Some(path) => BrandTable::load(path)?,
        None => BrandTable::default(),
    };

    let entries: Vec<ComparisonEntry> = serde_json::from_str(
        &fs::read_to_string(&args.stations)
            .with_context(|| format!("Failed to read {}", args.stations.display()))?,
    )
    .with_context(|| format!("Failed to parse {}", args.stations.display()))?;

    let families = families::collect(&entries, &brands);
    println!("Consolidated to {} brand families", families.len());
    println!();
    print_top_brands(&families);

    let agent = AgentBuilder::new()
        .timeout_connect(Duration::from_secs(args.timeout))
        .build();
    let client = Mudflap::new(
        agent.clone(),
        &args.api,
        args.radius,
        Duration::from_secs(args.timeout),
    );
    let resolution = resolve(
        &client,
        &brands,
        &families,
        Duration::from_secs_f64(args.delay.max(0.0)),
    );

    println!();
    println!("Found logos for {} brand families", resolution.found);
    println!("No logo found for {} brands", resolution.not_found);
    if !args.hide_chains {
        print_chains(&resolution.chains);
    }
    println!();

    if resolution.database.is_empty() {
        println!("No logos to download.");
        return Ok(());
    }

    let stats = download::download_all(
        &agent,
        &resolution.database,
        &args.output,
        Duration::from_secs(args.download_timeout),
        Duration::from_secs_f64(args.download_delay.max(0.0)),
    );

    let summary_path = args.output.join("logo_database.json");
    write_json(&summary_path, &Summary::new(&resolution.database))?;

    println!("## Summary");
    println!("- {} brand families found", resolution.found);
    println!("- {} logos downloaded", stats.downloaded);
    println!("- {} failed downloads", stats.failed);
    println!("- {} already existed", stats.skipped);
    println!("Logos saved to {}", args.output.display());
    println!("Database saved to {}", summary_path.display());

    if resolution.not_found > 0 {
        println!();
        println!("Tip: compare the chain names above with the brand table and pass");
        println!("an extended one with --brands to catch the missing brands.");
    }

    Ok(())
}

fn resolve(
    client: &Mudflap,
    brands: &BrandTable,
    families: &[BrandFamily],
    delay: Duration,
) -> Resolution {
    let mut resolution = Resolution::default();
    let pb = progress_bar(families.len() as u64);

    for (i, family) in families.iter().enumerate() {
        pb.inc(1);
        let label = format!("[{}/{}] {:<25}", i + 1, families.len(), family.brand);
        let Some(coords) = family.coords else {
            pb.suspend(|| println!("{label} no coordinates"));
            resolution.not_found += 1;
            continue;
        };

        pb.set_message(family.brand.clone());
        let aliases = brands.aliases(&family.brand);
        match client.find_logo(&aliases, coords, &mut resolution.chains) {
            Ok(Some(logo)) => {
                pb.suspend(|| println!("{label} found (chain: {})", logo.chain));
                resolution.database.insert(
                    family.brand.clone(),
                    LogoEntry::new(logo, family.count, &family.examples),
                );
                resolution.found += 1;
            }
            Ok(None) => {
                pb.suspend(|| println!("{label} not found"));
                resolution.not_found += 1;
            }
            Err(e) => {
                pb.suspend(|| warn!("{}: {e:#}", family.brand));
                resolution.not_found += 1;
            }
        }

        sleep(delay);
    }

    pb.finish_and_clear();
    resolution
}

fn print_top_brands(families: &[BrandFamily]) {
    println!("Top {TOP_BRANDS} brand families by location count:");
    for (i, family) in families.iter().take(TOP_BRANDS).enumerate() {
        let mut examples = family.examples.iter().take(2).join(", ");
        if family.examples.len() > 2 {
            examples.push_str("...");
        }
        println!(
            "{:2}. {:<20} ({:2} locations) {examples}",
            i + 1,
            family.brand,
            family.count
        );
    }
    println!();
}

fn print_chains(chains: &BTreeSet<String>) {
    if chains.is_empty() {
        return;
    }

    println!();
    println!("All unique chain names found in API ({} total):", chains.len());
    for chain in chains.iter().take(MAX_CHAINS_SHOWN) {
        println!("   {chain}");
    }
    if chains.len() > MAX_CHAINS_SHOWN {
        println!("   ... and {} more", chains.len() - MAX_CHAINS_SHOWN);
    }
}

#[cfg(test)]
mod tests {
    use std::{io::ErrorKind, net::TcpListener};

    use _model::Coords;
    use ureq::Agent;

    use super::*;

    fn family(brand: &str, coords: Option<Coords>) -> BrandFamily {
        BrandFamily {
            brand: brand.to_string(),
            coords,
            examples: vec![format!("{brand} #1")],
            count: 1,
        }
    }

    fn client(base: &str) -> Mudflap {
        Mudflap::new(Agent::new(), base, 150, Duration::from_secs(1))
    }

    #[test]
    fn failed_search_counts_as_not_found() {
        // nothing listens on the discard port
        let resolution = resolve(
            &client("http://127.0.0.1:9"),
            &BrandTable::default(),
            &[family("Shell", Some(Coords::new(41.5, -90.3)))],
            Duration::ZERO,
        );
        assert_eq!(resolution.found, 0);
        assert_eq!(resolution.not_found, 1);
        assert!(resolution.database.is_empty());
        assert!(resolution.chains.is_empty());
    }

    #[test]
    fn family_without_coordinates_makes_no_request() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let resolution = resolve(
            &client(&base),
            &BrandTable::default(),
            &[family("Fleet", None), family("Haymakers", None)],
            Duration::ZERO,
        );
        assert_eq!(resolution.not_found, 2);
        assert_eq!(resolution.found, 0);

        let pending = listener.accept().map(|_| ()).map_err(|e| e.kind());
        assert_eq!(pending, Err(ErrorKind::WouldBlock));
    }
}
