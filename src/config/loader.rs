//! Configuration loading from disk.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::parser::parse_config;
use crate::config::schema::Configuration;

/// Read and parse the topology file at `path`.
pub fn load_config(path: &Path) -> Result<Configuration, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(BufReader::new(file))?;

    tracing::info!(
        path = %path.display(),
        arches = config.arches().len(),
        clusters = config.clusters().len(),
        printers = config.printers().len(),
        machines = config.machines().len(),
        cgroups = config.cgroups().len(),
        "Configuration read"
    );
    Ok(config)
}
