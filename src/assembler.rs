//! Assembles areas from closed ways and from multipolygon relations with their
//! member ways.

pub mod config;
pub mod reclassify;
pub mod stats;
pub mod tags;

use std::collections::BTreeSet;
use std::slice;

use log::{debug, warn};

use crate::data::area::{Area, OuterRing};
use crate::data::osm::{ItemType, Relation, TagList, Way};
use crate::data::{ResolvedMember, WayIdx};
use crate::geometry::{RingAssembler, RingBuilder, SegmentExtractor, SegmentList};
use crate::output::OutputSink;
use crate::problem::{reborrow, ProblemReporter};

use self::config::AssemblerConfig;
use self::reclassify::classify_inner_rings;
use self::stats::AreaStats;
use self::tags::{select_relation_tags, KeyFilter, TagSource};

/// Builds areas and writes them to an `OutputSink`. Counters of everything that
/// happened are kept in `stats()`.
///
/// Inner ways of a relation that are tagged differently from the relation's area get
/// areas of their own. Each of those is built by a fresh assembler sharing the config,
/// its stats are added to this one's.
pub struct AreaAssembler<'a, S = SegmentList, B = RingAssembler> {
    config: &'a AssemblerConfig,
    reporter: Option<&'a mut dyn ProblemReporter>,
    filter: KeyFilter,
    segment_list: S,
    ring_builder: B,
    stats: AreaStats,
    geometry_problems_before: u64,
}

impl<'a> AreaAssembler<'a> {
    pub fn new(config: &'a AssemblerConfig, reporter: Option<&'a mut dyn ProblemReporter>) -> Self {
        AreaAssembler::with_collaborators(config, reporter)
    }
}

impl<'a, S: SegmentExtractor, B: RingBuilder> AreaAssembler<'a, S, B> {
    pub fn with_collaborators(
        config: &'a AssemblerConfig,
        reporter: Option<&'a mut dyn ProblemReporter>,
    ) -> Self {
        AreaAssembler {
            config,
            reporter,
            filter: KeyFilter::multipolygon(),
            segment_list: S::default(),
            ring_builder: B::default(),
            stats: AreaStats::default(),
            geometry_problems_before: 0,
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        self.config
    }

    pub fn stats(&self) -> AreaStats {
        self.stats
    }

    fn debug(&self) -> bool {
        self.config.debug_level > 0
    }

    fn reporter(&mut self) -> Option<&mut dyn ProblemReporter> {
        reborrow(&mut self.reporter)
    }

    fn reset(&mut self) {
        self.segment_list = S::default();
        self.ring_builder = B::default();
        self.geometry_problems_before = self.stats.geometry_problems();
    }

    /// Only problems found while assembling the current object count.
    fn report_ways(&self) -> bool {
        self.reporter.is_some() && self.stats.geometry_problems() > self.geometry_problems_before
    }

    fn build_rings(&mut self, ways: &[Way]) -> bool {
        self.ring_builder.build_rings(
            self.segment_list.segments(),
            ways,
            self.config.check_roles,
            reborrow(&mut self.reporter),
            &mut self.stats,
        )
    }

    fn add_rings_to_area(&self, area: &mut Area) {
        let rings = self.ring_builder.rings();
        for (idx, ring) in rings.iter().enumerate().filter(|(_, ring)| ring.is_outer()) {
            area.outer_rings.push(OuterRing {
                nodes: ring.locations().to_vec(),
                inner_rings: rings
                    .iter()
                    .filter(|inner| inner.parent() == Some(idx))
                    .map(|inner| inner.locations().to_vec())
                    .collect(),
            });
        }
    }

    /// Assembles an area from a closed way.
    ///
    /// Returns false if the area could not be built or the way id has no area id.
    /// Ways tagged `area=no` and all ways when way polygons are switched off are
    /// skipped and count as success.
    pub fn assemble_way(&mut self, way: &Way, out: &mut dyn OutputSink) -> bool {
        if !self.config.create_way_polygons {
            return true;
        }

        if way.tags.has_tag("area", "no") {
            return true;
        }

        let Some(area) = Area::from_way(way.id) else {
            warn!(way_id = way.id; "Way id out of range for an area id");
            return false;
        };

        self.reset();
        if let Some(reporter) = self.reporter() {
            reporter.set_object(ItemType::Way, way.id);
            reporter.set_nodes(way.nodes.len());
        }

        // Ways without segments are ignored, but counted.
        if way.nodes.len() < 2 {
            self.stats.short_ways += 1;
            return false;
        }

        if !way.ends_have_same_id() {
            self.stats.duplicate_nodes += 1;
            let (first, last) = (way.nodes[0], way.nodes[way.nodes.len() - 1]);
            if let Some(reporter) = self.reporter() {
                reporter.report_duplicate_node(first.id, last.id, first.location);
            }
        }

        self.stats.from_ways += 1;
        let invalid_locations = self.segment_list.extract_segments_from_way(
            reborrow(&mut self.reporter),
            &mut self.stats.duplicate_nodes,
            way,
            WayIdx(0),
        );
        self.stats.invalid_locations += invalid_locations;
        if !self.config.ignore_invalid_locations && invalid_locations > 0 {
            return false;
        }

        if self.debug() {
            debug!(way_id = way.id, segments = self.segment_list.len(); "Assembling way");
        }

        let okay = self.create_area_from_way(way, area, out);
        if okay {
            out.commit();
        } else {
            out.rollback();
        }

        if self.debug() {
            debug!(way_id = way.id, okay = okay, stats = self.stats.to_string(); "Done");
        }

        okay
    }

    fn create_area_from_way(&mut self, way: &Way, mut area: Area, out: &mut dyn OutputSink) -> bool {

        let area_okay = self.build_rings(slice::from_ref(way));
        if area_okay || self.config.create_empty_areas {
            area.tags = way.tags.clone();
        }
        if area_okay {
            self.add_rings_to_area(&mut area);
        }

        if self.report_ways() {
            if let Some(reporter) = self.reporter() {
                reporter.report_way(way);
            }
        }

        out.write(area);
        area_okay || self.config.create_empty_areas
    }

    /// Assembles an area from a multipolygon relation and those of its way members
    /// that could be found. `members` refer into `ways`.
    ///
    /// Returns false if the area, or one of the areas built from its inner ways, could
    /// not be built. A relation whose area was dropped because of the configured
    /// multipolygon style still returns true.
    pub fn assemble_relation(
        &mut self,
        relation: &Relation,
        members: &[ResolvedMember],
        ways: &[Way],
        out: &mut dyn OutputSink,
    ) -> bool {
        debug_assert!(relation.members.len() >= members.len());

        let Some(area) = Area::from_relation(relation.id) else {
            warn!(relation_id = relation.id; "Relation id out of range for an area id");
            return false;
        };

        self.reset();
        if let Some(reporter) = self.reporter() {
            reporter.set_object(ItemType::Relation, relation.id);
        }

        if relation.members.is_empty() {
            self.stats.no_way_in_mp_relation += 1;
            return false;
        }

        self.stats.from_relations += 1;
        let invalid_locations = self.segment_list.extract_segments_from_ways(
            reborrow(&mut self.reporter),
            &mut self.stats.duplicate_nodes,
            &mut self.stats.duplicate_ways,
            members,
            ways,
        );
        self.stats.invalid_locations += invalid_locations;
        if !self.config.ignore_invalid_locations && invalid_locations > 0 {
            return false;
        }

        self.stats.member_ways += members.len() as u64;
        if members.len() == 1 {
            self.stats.single_way_in_mp_relation += 1;
        }

        if self.debug() {
            debug!(
                relation_id = relation.id, member_ways = members.len(), segments = self.segment_list.len();
                "Assembling relation"
            );
        }

        let wrong_role_before = self.stats.wrong_role;
        let (mut okay, tag_source) = self.create_area_from_relation(relation, area, members, ways, out);

        // Tags of the area just built, whether or not it is kept.
        let area_tags = out
            .get(out.committed())
            .map(|area| area.tags.clone())
            .unwrap_or_default();

        if okay && self.style_accepts(tag_source) {
            out.commit();
        } else {
            out.rollback();
        }

        let worklist = if self.stats.wrong_role == wrong_role_before {
            self.inner_ways_needing_areas(members, ways, &area_tags)
        } else {
            Vec::new()
        };

        if self.debug() {
            debug!(
                relation_id = relation.id, okay = okay, inner_areas = worklist.len(), stats = self.stats.to_string();
                "Done"
            );
        }

        if !self.assemble_inner_areas(&worklist, ways, out) {
            okay = false;
        }

        okay
    }

    fn create_area_from_relation(
        &mut self,
        relation: &Relation,
        mut area: Area,
        members: &[ResolvedMember],
        ways: &[Way],
        out: &mut dyn OutputSink,
    ) -> (bool, Option<TagSource>) {
        let mut tag_source = None;

        let area_okay = self.build_rings(ways);
        if area_okay || self.config.create_empty_areas {
            let (tags, source) = self.relation_tags(relation, ways);
            area.tags = tags;
            tag_source = Some(source);
        }
        if area_okay {
            self.add_rings_to_area(&mut area);
        }

        if self.report_ways() {
            if let Some(reporter) = self.reporter() {
                for member in members {
                    reporter.report_way(&ways[member.way.0]);
                }
            }
        }

        out.write(area);
        (area_okay || self.config.create_empty_areas, tag_source)
    }

    fn relation_tags(&mut self, relation: &Relation, ways: &[Way]) -> (TagList, TagSource) {
        let mut outer_way_ids = BTreeSet::new();
        for ring in self.ring_builder.rings().iter().filter(|ring| ring.is_outer()) {
            ring.get_ways(&mut outer_way_ids);
        }
        let outer_ways: Vec<&Way> = outer_way_ids.iter().map(|idx| &ways[idx.0]).collect();

        let (tags, source) = select_relation_tags(
            &relation.tags,
            &outer_ways,
            self.config.keep_type_tag,
            &self.filter,
        );

        if source == TagSource::OuterWays {
            self.stats.no_tags_on_relation += 1;
        }
        if self.debug() {
            debug!(
                relation_id = relation.id, from_relation = (source == TagSource::Relation),
                outer_ways = outer_ways.len(), tags = tags.len();
                "Selected area tags"
            );
        }

        (tags, source)
    }

    /// New style multipolygons carry their tags on the relation, old style ones on
    /// the outer ways.
    fn style_accepts(&self, tag_source: Option<TagSource>) -> bool {
        let from_ways = tag_source == Some(TagSource::OuterWays);
        (self.config.create_new_style_polygons && !from_ways)
            || (self.config.create_old_style_polygons && from_ways)
    }

    fn inner_ways_needing_areas(
        &mut self,
        members: &[ResolvedMember],
        ways: &[Way],
        area_tags: &TagList,
    ) -> Vec<WayIdx> {
        let inner = classify_inner_rings(members, ways, area_tags, &self.filter);

        for way_idx in &inner.same_tags {
            self.stats.inner_with_same_tags += 1;
            if let Some(reporter) = self.reporter() {
                reporter.report_inner_with_same_tags(&ways[way_idx.0]);
            }
        }

        inner.needs_area
    }

    fn assemble_inner_areas(
        &mut self,
        worklist: &[WayIdx],
        ways: &[Way],
        out: &mut dyn OutputSink,
    ) -> bool {
        let config = self.config;
        let mut okay = true;

        for way_idx in worklist {
            let mut assembler =
                AreaAssembler::<S, B>::with_collaborators(config, reborrow(&mut self.reporter));
            if !assembler.assemble_way(&ways[way_idx.0], out) {
                okay = false;
            }
            self.stats += assembler.stats();
        }

        okay
    }
}
