use std::fs::{create_dir_all, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assembler::config::AssemblerConfig;
use crate::errors::Result;

#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    pub data_path: String,
    pub dest_path: String,
    #[serde(default = "default_report_problems")]
    pub report_problems: bool,
    #[serde(default)]
    pub assembler: AssemblerConfig,
}

fn default_report_problems() -> bool {
    true
}

pub fn load_user_config(path: &str) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| format!("Could not open config file {}: {}", path, err))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Output goes to a directory named after the input file, below `dest_path`.
pub fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let input_fname = Path::new(&config.data_path)
        .file_name()
        .ok_or("Could not get input file name")?;
    let output_dir = Path::new(&config.dest_path).join(input_fname);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}
