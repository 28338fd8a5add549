use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use larvnetd::config::loader::load_config;
use larvnetd::config::{Architecture, CGroup, Cluster, ClusterId, Configuration, GlobalOptions};

#[derive(Parser)]
#[command(name = "larvnet-cli")]
#[command(about = "Inspect larvnetd topology files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a topology file and print a summary
    Check { file: PathBuf },
    /// Print the parsed topology as JSON
    Dump { file: PathBuf },
}

#[derive(Serialize)]
struct TopologyDump<'a> {
    arches: &'a [Architecture],
    clusters: &'a [Cluster],
    printers: Vec<EntityDump<'a>>,
    machines: Vec<EntityDump<'a>>,
    cgroups: &'a [CGroup],
    options: &'a GlobalOptions,
}

#[derive(Serialize)]
struct EntityDump<'a> {
    name: &'a str,
    cluster: ClusterId,
}

impl<'a> TopologyDump<'a> {
    fn new(config: &'a Configuration) -> Self {
        Self {
            arches: config.arches(),
            clusters: config.clusters(),
            printers: config
                .printers()
                .iter()
                .map(|p| EntityDump { name: &p.name, cluster: p.cluster })
                .collect(),
            machines: config
                .machines()
                .iter()
                .map(|m| EntityDump { name: &m.name, cluster: m.cluster })
                .collect(),
            cgroups: config.cgroups(),
            options: config.options(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => {
            let config = load_config(&file)?;
            println!("{}: ok", file.display());
            println!("  architectures: {}", config.arches().len());
            println!("  clusters:      {}", config.clusters().len());
            println!("  printers:      {}", config.printers().len());
            println!("  workstations:  {}", config.machines().len());
            println!("  cgroups:       {}", config.cgroups().len());
        }
        Commands::Dump { file } => {
            let config = load_config(&file)?;
            println!("{}", serde_json::to_string_pretty(&TopologyDump::new(&config))?);
        }
    }

    Ok(())
}
