use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod coordinates;
mod logos;
mod utils;

#[derive(Debug, Parser)]
#[command(about = "Truck stop brand logos and store coordinates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find and download a logo for every brand in the comparison file
    Logos(logos::LogoArgs),
    /// Patch store coordinates from a CSV into the comparison file
    Coordinates(coordinates::CoordinateArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Logos(args) => logos::main(args),
        Command::Coordinates(args) => coordinates::main(args),
    }
}
