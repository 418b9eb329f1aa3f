use osm_area_assembly::data::osm::{ItemType, Location, NodeRef, Relation, RelationMember, TagList, Way};
use osm_area_assembly::data::OsmData;
use osm_area_assembly::problem::{Problem, ProblemCollector};
use osm_area_assembly::{AreaAssembler, AreaStats, AssemblerConfig, OutputBuffer, OutputSink};

fn tags(pairs: &[(&str, &str)]) -> TagList {
    pairs.iter().copied().collect()
}

fn way(id: i64, nodes: &[(i64, i32, i32)], tag_pairs: &[(&str, &str)]) -> Way {
    Way {
        id,
        nodes: nodes
            .iter()
            .map(|&(id, x, y)| NodeRef::new(id, Location::new(x, y)))
            .collect(),
        tags: tags(tag_pairs),
    }
}

fn multipolygon(id: i64, tag_pairs: &[(&str, &str)], members: &[(i64, &str)]) -> Relation {
    Relation {
        id,
        tags: tags(tag_pairs),
        members: members
            .iter()
            .map(|&(ref_id, role)| RelationMember {
                member_type: ItemType::Way,
                id: ref_id,
                role: role.to_string(),
            })
            .collect(),
    }
}

fn config() -> AssemblerConfig {
    AssemblerConfig {
        create_empty_areas: false,
        ..AssemblerConfig::default()
    }
}

/// Square from (0,0) to (100,100) with a hole from (25,25) to (75,75).
fn forest_with_hole(inner_tags: &[(&str, &str)]) -> OsmData {
    let outer = way(
        10,
        &[(1, 0, 0), (2, 100, 0), (3, 100, 100), (4, 0, 100), (1, 0, 0)],
        &[],
    );
    let inner = way(
        11,
        &[(5, 25, 25), (6, 75, 25), (7, 75, 75), (8, 25, 75), (5, 25, 25)],
        inner_tags,
    );
    let relation = multipolygon(
        1,
        &[("type", "multipolygon"), ("landuse", "grass")],
        &[(10, "outer"), (11, "inner")],
    );
    OsmData::new(vec![outer, inner], vec![relation])
}

fn assemble_relation(data: &OsmData, config: &AssemblerConfig, out: &mut OutputBuffer) -> (bool, AreaStats) {
    let relation = &data.relations[0];
    let members = data.resolve_members(relation);
    let mut assembler = AreaAssembler::new(config, None);
    let okay = assembler.assemble_relation(relation, &members, &data.ways, out);
    (okay, assembler.stats())
}

#[test]
fn closed_way_is_assembled() {
    let config = config();
    let mut out = OutputBuffer::new();
    let way = way(
        42,
        &[(1, 0, 0), (2, 100, 0), (3, 50, 80), (1, 0, 0)],
        &[("highway", "residential")],
    );

    let mut assembler = AreaAssembler::new(&config, None);
    assert!(assembler.assemble_way(&way, &mut out));

    assert_eq!(out.committed(), 1);
    let area = &out.areas()[0];
    assert_eq!(area.source_id, 42);
    assert_eq!(area.tags, tags(&[("highway", "residential")]));
    assert_eq!(area.num_rings(), (1, 0));
}

#[test]
fn short_ways_fail_once_without_output() {
    let config = config();
    for nodes in [vec![], vec![(1, 0, 0)]] {
        let mut out = OutputBuffer::new();
        let mut assembler = AreaAssembler::new(&config, None);

        assert!(!assembler.assemble_way(&way(1, &nodes, &[("building", "yes")]), &mut out));
        assert_eq!(assembler.stats().short_ways, 1);
        assert_eq!(out.committed(), 0);
    }
}

#[test]
fn area_no_is_a_successful_no_op() {
    let config = config();
    let mut out = OutputBuffer::new();
    let mut assembler = AreaAssembler::new(&config, None);
    let way = way(
        1,
        &[(1, 0, 0), (2, 10, 0), (3, 10, 10), (1, 0, 0)],
        &[("highway", "pedestrian"), ("area", "no")],
    );

    assert!(assembler.assemble_way(&way, &mut out));
    assert_eq!(assembler.stats(), AreaStats::default());
    assert_eq!(out.committed(), 0);
}

#[test]
fn outer_ways_without_relation_tags_share_their_common_tags() {
    let config = config();
    let shared = [("landuse", "forest"), ("source", "x")];
    let west = way(10, &[(1, 0, 0), (2, 100, 0), (3, 100, 100)], &shared);
    let east = way(11, &[(3, 100, 100), (4, 0, 100), (1, 0, 0)], &shared);
    let relation = multipolygon(5, &[("type", "multipolygon")], &[(10, "outer"), (11, "outer")]);
    let data = OsmData::new(vec![west, east], vec![relation]);

    let mut out = OutputBuffer::new();
    let (okay, stats) = assemble_relation(&data, &config, &mut out);

    assert!(okay);
    assert_eq!(stats.no_tags_on_relation, 1);
    assert_eq!(out.committed(), 1);
    assert_eq!(out.areas()[0].tags, tags(&[("landuse", "forest"), ("source", "x")]));
}

#[test]
fn inner_way_with_area_tags_is_just_a_hole() {
    let config = config();
    let data = forest_with_hole(&[("landuse", "grass"), ("note", "mown")]);
    let mut collector = ProblemCollector::new();
    let mut out = OutputBuffer::new();

    let relation = &data.relations[0];
    let members = data.resolve_members(relation);
    let mut assembler = AreaAssembler::new(&config, Some(&mut collector));
    assert!(assembler.assemble_relation(relation, &members, &data.ways, &mut out));
    let stats = assembler.stats();

    assert_eq!(stats.inner_with_same_tags, 1);
    assert_eq!(stats.from_ways, 0);
    assert_eq!(out.committed(), 1);
    assert_eq!(out.areas()[0].num_rings(), (1, 1));
    assert_eq!(
        collector.count(|p| matches!(p, Problem::InnerWithSameTags { way_id: 11 })),
        1
    );
}

#[test]
fn differently_tagged_inner_way_gets_its_own_area() {
    let config = config();
    let data = forest_with_hole(&[("natural", "water")]);
    let mut out = OutputBuffer::new();

    let (okay, stats) = assemble_relation(&data, &config, &mut out);

    assert!(okay);
    assert_eq!(out.committed(), 2);
    assert_eq!(out.areas()[0].source_id, 1);
    assert_eq!(out.areas()[1].source_id, 11);
    assert_eq!(out.areas()[1].tags, tags(&[("natural", "water")]));

    // Relation: one outer and one inner ring. Child: one outer ring.
    assert_eq!(stats.from_relations, 1);
    assert_eq!(stats.from_ways, 1);
    assert_eq!(stats.outer_rings, 2);
    assert_eq!(stats.inner_rings, 1);
    assert_eq!(stats.inner_with_same_tags, 0);
}

#[test]
fn superset_of_area_tags_gets_its_own_area() {
    let config = config();
    let data = forest_with_hole(&[("landuse", "grass"), ("name", "Meadow")]);
    let mut out = OutputBuffer::new();

    let (okay, stats) = assemble_relation(&data, &config, &mut out);

    assert!(okay);
    assert_eq!(stats.from_ways, 1);
    assert_eq!(out.committed(), 2);
}

#[test]
fn style_mismatch_drops_valid_geometry_but_succeeds() {
    let config = AssemblerConfig {
        create_new_style_polygons: true,
        create_old_style_polygons: false,
        ..config()
    };
    let outer = way(
        10,
        &[(1, 0, 0), (2, 100, 0), (3, 100, 100), (4, 0, 100), (1, 0, 0)],
        &[("landuse", "grass")],
    );
    let old_style = multipolygon(2, &[("type", "multipolygon"), ("source", "x")], &[(10, "outer")]);
    let data = OsmData::new(vec![outer], vec![old_style]);
    let mut out = OutputBuffer::new();

    let (okay, stats) = assemble_relation(&data, &config, &mut out);

    assert!(okay);
    assert_eq!(stats.no_tags_on_relation, 1);
    assert_eq!(stats.outer_rings, 1);
    assert_eq!(out.committed(), 0);
}

#[test]
fn stats_of_separate_runs_add_up() {
    let config = config();
    let data = forest_with_hole(&[("natural", "water")]);
    let mut out = OutputBuffer::new();

    let (_, relation_stats) = assemble_relation(&data, &config, &mut out);
    let mut assembler = AreaAssembler::new(&config, None);
    assembler.assemble_way(&data.ways[0], &mut out);
    let way_stats = assembler.stats();

    let total: AreaStats = [relation_stats, way_stats].into_iter().sum();
    assert_eq!(total.from_ways, 2);
    assert_eq!(total.from_relations, 1);
    assert_eq!(total, way_stats + relation_stats);
}
