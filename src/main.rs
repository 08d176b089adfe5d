mod etl;
mod data;
mod errors;

use std::env;
use std::fs::File;
use std::io;

use log::info;
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::etl::osm_to_csv::OsmToCsvEtl;
use crate::etl::Etl;
use crate::errors::{Error, ErrorKind, Result};

const DEFAULT_CONFIG_PATH: &str = "config/osm_to_csv.json";

/// Output CSV paths. The point/path names are accepted as aliases.
#[derive(Deserialize, Debug, Clone)]
pub struct OutputPaths {
    #[serde(alias = "points")]
    pub nodes: String,
    #[serde(alias = "point_tags")]
    pub node_tags: String,
    #[serde(alias = "paths")]
    pub ways: String,
    #[serde(alias = "path_members")]
    pub way_nodes: String,
    #[serde(alias = "path_tags")]
    pub way_tags: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    pub input_path: String,
    pub outputs: OutputPaths,
    /// Schema-check every element. About 10x slower, use on samples.
    #[serde(default)]
    pub validate: bool,
}

fn load_user_config(path: &str) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|e| Error::new(ErrorKind::Config, format!("Could not open config file {path}: {e}")))?;
    serde_json::from_reader(file)
        .map_err(|e| Error::new(ErrorKind::Config, format!("Could not parse config {path}: {e}")))
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let user_config = load_user_config(&config_path)?;
    info!(
        config = config_path.as_str(),
        input = user_config.input_path.as_str(),
        validate = user_config.validate;
        "Loaded config"
    );

    let mut etl = OsmToCsvEtl::new(&user_config)?;
    etl.process()?;

    Ok(())
}
