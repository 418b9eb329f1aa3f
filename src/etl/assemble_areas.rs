use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use log::info;
use tqdm::tqdm;

use crate::assembler::stats::AreaStats;
use crate::assembler::tags::KeyFilter;
use crate::assembler::AreaAssembler;
use crate::config::UserConfig;
use crate::data::area::Area;
use crate::data::osm::{ItemType, OsmId, Relation, Way};
use crate::data::OsmData;
use crate::errors::Result;
use crate::output::OutputBuffer;
use crate::problem::{reborrow, LogProblemReporter, ProblemReporter};

use super::Etl;

pub const ETL_NAME: &str = "assemble_areas";
pub const OUTPUT_FILE_NAME: &str = "areas.rkyv";
pub const STATS_FILE_NAME: &str = "stats.json";

pub struct AssembledAreas {
    pub areas: Vec<Area>,
    pub stats: AreaStats,
    pub failed_ways: usize,
    pub failed_relations: usize,
}

pub struct AssembleAreasEtl<'a> {
    config: &'a UserConfig,
    filter: KeyFilter,
}

/// Closed ways with at least one meaningful tag. Anything with fewer than four
/// nodes can't enclose anything.
pub fn is_area_way(way: &Way, filter: &KeyFilter) -> bool {
    way.is_closed() && way.nodes.len() > 3 && filter.count(&way.tags) > 0
}

pub fn is_multipolygon(relation: &Relation) -> bool {
    matches!(relation.tags.get("type"), Some("multipolygon") | Some("boundary"))
}

/// Ways that are members of a multipolygon. Their areas come from the relation,
/// or from the relation's assembler if they are tagged differently.
pub fn multipolygon_member_ways(data: &OsmData) -> HashSet<OsmId> {
    data.relations
        .iter()
        .filter(|relation| is_multipolygon(relation))
        .flat_map(|relation| relation.members.iter())
        .filter(|member| member.member_type == ItemType::Way)
        .map(|member| member.id)
        .collect()
}

pub fn read_areas(path: &Path) -> Result<Vec<Area>> {
    let bytes = fs::read(path)?;
    let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(&bytes);
    // The file is only ever written by `AssembleAreasEtl::load`.
    let areas: Vec<Area> = unsafe { rkyv::from_bytes_unchecked(&aligned) }
        .map_err(|err| format!("Could not deserialize areas: {:?}", err))?;
    Ok(areas)
}

impl AssembleAreasEtl<'_> {
    pub fn new(config: &UserConfig) -> AssembleAreasEtl {
        AssembleAreasEtl {
            config,
            filter: KeyFilter::multipolygon(),
        }
    }

    fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    fn stats_path(dir: &Path) -> PathBuf {
        dir.join(STATS_FILE_NAME)
    }

    /// Runs one assembler per way and per relation and adds up their stats. Ways
    /// belonging to a multipolygon are left to the relation.
    pub fn assemble(&self, data: &OsmData, reporter: Option<&mut dyn ProblemReporter>) -> AssembledAreas {
        let mut reporter = reporter;
        let mut out = OutputBuffer::new();
        let mut stats = AreaStats::default();
        let (mut failed_ways, mut failed_relations) = (0, 0);

        let member_ways = multipolygon_member_ways(data);
        info!(member_ways = member_ways.len(); "Leaving multipolygon members to their relations");

        for way in tqdm(data.ways.iter()) {
            if member_ways.contains(&way.id) || !is_area_way(way, &self.filter) {
                continue;
            }
            let mut assembler = AreaAssembler::new(&self.config.assembler, reborrow(&mut reporter));
            if !assembler.assemble_way(way, &mut out) {
                failed_ways += 1;
            }
            stats += assembler.stats();
        }

        for relation in tqdm(data.relations.iter()) {
            if !is_multipolygon(relation) {
                continue;
            }
            let members = data.resolve_members(relation);
            let mut assembler = AreaAssembler::new(&self.config.assembler, reborrow(&mut reporter));
            if !assembler.assemble_relation(relation, &members, &data.ways, &mut out) {
                failed_relations += 1;
            }
            stats += assembler.stats();
        }

        AssembledAreas {
            areas: out.into_areas(),
            stats,
            failed_ways,
            failed_relations,
        }
    }
}

impl Etl for AssembleAreasEtl<'_> {
    type Input = OsmData;
    type Output = AssembledAreas;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        for path in [Self::output_path(dir), Self::stats_path(dir)] {
            if path.try_exists()? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let file = File::open(&self.config.data_path)
            .map_err(|err| format!("Could not open {}: {}", self.config.data_path, err))?;
        let data: OsmData = serde_json::from_reader(BufReader::new(file))?;
        info!(ways = data.ways.len(), relations = data.relations.len(); "Read map data");
        Ok(data)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut log_reporter = LogProblemReporter::new();
        let reporter: Option<&mut dyn ProblemReporter> = if self.config.report_problems {
            Some(&mut log_reporter)
        } else {
            None
        };

        let output = self.assemble(&input, reporter);
        info!(
            areas = output.areas.len(), failed_ways = output.failed_ways,
            failed_relations = output.failed_relations, stats = output.stats.to_string();
            "Assembled areas"
        );
        Ok(output)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let bytes = rkyv::to_bytes::<_, 256>(&output.areas)
            .map_err(|err| format!("Could not serialize areas: {:?}", err))?;
        let mut output_file = File::create(Self::output_path(dir))?;
        output_file.write_all(&bytes)?;

        let stats_file = File::create(Self::stats_path(dir))?;
        serde_json::to_writer_pretty(stats_file, &output.stats)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::config::AssemblerConfig;
    use crate::data::area::AreaSource;
    use crate::problem::ProblemCollector;

    const FOREST: &str = r#"{
        "ways": [
            {"id": 1, "tags": {"landuse": "forest", "source": "survey"}, "nodes": [
                {"id": 1, "lon": 0.0, "lat": 0.0}, {"id": 2, "lon": 0.01, "lat": 0.0}, {"id": 3, "lon": 0.01, "lat": 0.01},
                {"id": 4, "lon": 0.0, "lat": 0.01}, {"id": 1, "lon": 0.0, "lat": 0.0}
            ]},
            {"id": 2, "tags": {"natural": "water"}, "nodes": [
                {"id": 5, "lon": 0.002, "lat": 0.002}, {"id": 6, "lon": 0.004, "lat": 0.002}, {"id": 7, "lon": 0.004, "lat": 0.004},
                {"id": 8, "lon": 0.002, "lat": 0.004}, {"id": 5, "lon": 0.002, "lat": 0.002}
            ]},
            {"id": 3, "tags": {"highway": "track"}, "nodes": [
                {"id": 1, "lon": 0.0, "lat": 0.0}, {"id": 9, "lon": 0.02, "lat": 0.02}
            ]},
            {"id": 4, "tags": {"source": "survey"}, "nodes": [
                {"id": 10, "lon": 1.0, "lat": 1.0}, {"id": 11, "lon": 1.01, "lat": 1.0}, {"id": 12, "lon": 1.01, "lat": 1.01},
                {"id": 10, "lon": 1.0, "lat": 1.0}
            ]}
        ],
        "relations": [
            {"id": 1, "tags": {"type": "multipolygon"}, "members": [
                {"type": "way", "ref": 1, "role": "outer"},
                {"type": "way", "ref": 2, "role": "inner"},
                {"type": "way", "ref": 77, "role": "outer"}
            ]},
            {"id": 2, "tags": {"type": "route"}, "members": [{"type": "way", "ref": 3, "role": ""}]}
        ]
    }"#;

    fn config(dir: &Path) -> UserConfig {
        let data_path = dir.join("forest.json");
        fs::write(&data_path, FOREST).unwrap();
        UserConfig {
            data_path: data_path.to_str().unwrap().to_string(),
            dest_path: dir.to_str().unwrap().to_string(),
            report_problems: false,
            assembler: AssemblerConfig {
                create_empty_areas: false,
                ..AssemblerConfig::default()
            },
        }
    }

    #[test]
    fn selects_area_candidates() {
        let data: OsmData = serde_json::from_str(FOREST).unwrap();
        let filter = KeyFilter::multipolygon();
        let candidates: Vec<_> = data
            .ways
            .iter()
            .filter(|way| is_area_way(way, &filter))
            .map(|way| way.id)
            .collect();
        assert_eq!(candidates, vec![1, 2]);
        assert!(is_multipolygon(&data.relations[0]));
        assert!(!is_multipolygon(&data.relations[1]));

        // Route members stay candidates, the missing way 77 is harmless.
        let members = multipolygon_member_ways(&data);
        assert_eq!(members, HashSet::from([1, 2, 77]));
    }

    #[test]
    fn ways_outside_multipolygons_get_their_own_area() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let etl = AssembleAreasEtl::new(&config);
        let mut data: OsmData = serde_json::from_str(FOREST).unwrap();
        data.relations.clear();

        let output = etl.assemble(&data, None);

        let ids: Vec<_> = output.areas.iter().map(|area| area.source_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(output.areas.iter().all(|area| area.source == AreaSource::Way));
        assert_eq!(output.stats.from_ways, 2);
        assert_eq!(output.stats.from_relations, 0);
    }

    #[test]
    fn assembles_ways_and_relations() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let etl = AssembleAreasEtl::new(&config);
        let data: OsmData = serde_json::from_str(FOREST).unwrap();
        let mut collector = ProblemCollector::new();

        let output = etl.assemble(&data, Some(&mut collector));

        // The relation built from way 1's tags, then way 2 as a differently tagged
        // inner ring. Neither way is assembled on its own.
        let sources: Vec<_> = output
            .areas
            .iter()
            .map(|area| (area.source, area.source_id))
            .collect();
        assert_eq!(
            sources,
            vec![(AreaSource::Relation, 1), (AreaSource::Way, 2)]
        );
        let ids: Vec<_> = output.areas.iter().map(|area| area.id).collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(output.stats.from_ways, 1);
        assert_eq!(output.stats.from_relations, 1);
        assert_eq!(output.stats.no_tags_on_relation, 1);
        assert_eq!(output.failed_ways, 0);
        assert_eq!(output.failed_relations, 0);
        assert_eq!(output.areas[0].num_rings(), (1, 1));
    }

    #[test]
    fn process_writes_and_caches_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut etl = AssembleAreasEtl::new(&config);
        let output_dir = dir.path().join("out");
        fs::create_dir_all(&output_dir).unwrap();

        assert!(!etl.is_cached(&output_dir).unwrap());
        etl.process(&output_dir).unwrap();
        assert!(etl.is_cached(&output_dir).unwrap());

        let areas = read_areas(&output_dir.join(OUTPUT_FILE_NAME)).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].tags.get("landuse"), Some("forest"));

        let stats: AreaStats =
            serde_json::from_str(&fs::read_to_string(output_dir.join(STATS_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(stats.from_relations, 1);

        etl.clean(&output_dir).unwrap();
        assert!(!etl.is_cached(&output_dir).unwrap());
        assert!(!output_dir.join(STATS_FILE_NAME).exists());
    }

    #[test]
    fn missing_input_fails_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.data_path = dir.path().join("missing.json").to_str().unwrap().to_string();
        let mut etl = AssembleAreasEtl::new(&config);

        let err = etl.process(dir.path()).unwrap_err();
        assert!(err.message.starts_with("Could not open"));
    }
}
