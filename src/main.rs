use std::env;
use std::io;

use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_area_assembly::config::{create_output_dir, load_user_config};
use osm_area_assembly::errors::Result;
use osm_area_assembly::etl::assemble_areas::{read_areas, AssembleAreasEtl, OUTPUT_FILE_NAME};
use osm_area_assembly::etl::Etl;

const DEFAULT_CONFIG_PATH: &str = "config/assemble.json";

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let user_config = load_user_config(&config_path)?;
    let output_dir = create_output_dir(&user_config)?;

    let mut etl = AssembleAreasEtl::new(&user_config);
    etl.process(&output_dir)?;

    let areas = read_areas(&output_dir.join(OUTPUT_FILE_NAME))?;
    let (multipolygons, empty) = areas.iter().fold((0, 0), |(multi, empty), area| {
        (multi + usize::from(area.is_multipolygon()), empty + usize::from(area.is_empty()))
    });
    info!(areas = areas.len(), multipolygons = multipolygons, empty = empty; "Read areas from cache");

    Ok(())
}
