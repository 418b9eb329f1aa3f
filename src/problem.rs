use log::warn;

use crate::data::osm::{ItemType, Location, OsmId, Way};

/// Receives diagnostics found while assembling areas. Every method has an empty
/// default so implementations only pick what they care about.
pub trait ProblemReporter {
    /// Sets the object all following reports are about.
    fn set_object(&mut self, _item_type: ItemType, _id: OsmId) {}

    fn set_nodes(&mut self, _nodes: usize) {}

    fn report_duplicate_node(&mut self, _node_a: OsmId, _node_b: OsmId, _location: Location) {}

    fn report_invalid_location(&mut self, _way_id: OsmId, _node_id: OsmId) {}

    fn report_duplicate_segment(&mut self, _start: Location, _end: Location) {}

    fn report_ring_not_closed(&mut self, _location: Location) {}

    fn report_role_should_be_outer(&mut self, _way_id: OsmId, _start: Location, _end: Location) {}

    fn report_role_should_be_inner(&mut self, _way_id: OsmId, _start: Location, _end: Location) {}

    fn report_way(&mut self, _way: &Way) {}

    fn report_inner_with_same_tags(&mut self, _way: &Way) {}
}

/// Reborrows an optional reporter for a shorter time, so it can be handed to
/// one assembler after another.
pub fn reborrow<'s>(
    reporter: &'s mut Option<&mut dyn ProblemReporter>,
) -> Option<&'s mut dyn ProblemReporter> {
    match reporter {
        Some(reporter) => Some(&mut **reporter),
        None => None,
    }
}

/// Writes every problem to the log.
#[derive(Debug, Default)]
pub struct LogProblemReporter {
    object_type: Option<ItemType>,
    object_id: OsmId,
    nodes: usize,
}

impl LogProblemReporter {
    pub fn new() -> Self {
        LogProblemReporter::default()
    }

    fn object_type(&self) -> &'static str {
        match self.object_type {
            Some(ItemType::Node) => "node",
            Some(ItemType::Way) => "way",
            Some(ItemType::Relation) => "relation",
            None => "unknown",
        }
    }
}

impl ProblemReporter for LogProblemReporter {
    fn set_object(&mut self, item_type: ItemType, id: OsmId) {
        self.object_type = Some(item_type);
        self.object_id = id;
        self.nodes = 0;
    }

    fn set_nodes(&mut self, nodes: usize) {
        self.nodes = nodes;
    }

    fn report_duplicate_node(&mut self, node_a: OsmId, node_b: OsmId, location: Location) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id,
            node_a = node_a, node_b = node_b, lon = location.lon(), lat = location.lat();
            "Duplicate node"
        );
    }

    fn report_invalid_location(&mut self, way_id: OsmId, node_id: OsmId) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id,
            way_id = way_id, node_id = node_id;
            "Invalid location"
        );
    }

    fn report_duplicate_segment(&mut self, start: Location, end: Location) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id,
            start_lon = start.lon(), start_lat = start.lat(), end_lon = end.lon(), end_lat = end.lat();
            "Duplicate segment"
        );
    }

    fn report_ring_not_closed(&mut self, location: Location) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id,
            nodes = self.nodes, lon = location.lon(), lat = location.lat();
            "Ring not closed"
        );
    }

    fn report_role_should_be_outer(&mut self, way_id: OsmId, start: Location, _end: Location) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id,
            way_id = way_id, lon = start.lon(), lat = start.lat();
            "Role should be outer"
        );
    }

    fn report_role_should_be_inner(&mut self, way_id: OsmId, start: Location, _end: Location) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id,
            way_id = way_id, lon = start.lon(), lat = start.lat();
            "Role should be inner"
        );
    }

    fn report_way(&mut self, way: &Way) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id,
            way_id = way.id, way_nodes = way.nodes.len();
            "Way involved in problem"
        );
    }

    fn report_inner_with_same_tags(&mut self, way: &Way) {
        warn!(
            object_type = self.object_type(), object_id = self.object_id, way_id = way.id;
            "Inner way has same tags as the area"
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    DuplicateNode {
        node_a: OsmId,
        node_b: OsmId,
        location: Location,
    },
    InvalidLocation {
        way_id: OsmId,
        node_id: OsmId,
    },
    DuplicateSegment {
        start: Location,
        end: Location,
    },
    RingNotClosed {
        location: Location,
    },
    RoleShouldBeOuter {
        way_id: OsmId,
    },
    RoleShouldBeInner {
        way_id: OsmId,
    },
    Way {
        way_id: OsmId,
    },
    InnerWithSameTags {
        way_id: OsmId,
    },
}

/// Keeps problems in memory, tagged with the object they were found on.
#[derive(Debug, Default)]
pub struct ProblemCollector {
    current: Option<(ItemType, OsmId)>,
    pub problems: Vec<(Option<(ItemType, OsmId)>, Problem)>,
}

impl ProblemCollector {
    pub fn new() -> Self {
        ProblemCollector::default()
    }

    pub fn count(&self, matches: impl Fn(&Problem) -> bool) -> usize {
        self.problems
            .iter()
            .filter(|(_, problem)| matches(problem))
            .count()
    }

    fn push(&mut self, problem: Problem) {
        self.problems.push((self.current, problem));
    }
}

impl ProblemReporter for ProblemCollector {
    fn set_object(&mut self, item_type: ItemType, id: OsmId) {
        self.current = Some((item_type, id));
    }

    fn report_duplicate_node(&mut self, node_a: OsmId, node_b: OsmId, location: Location) {
        self.push(Problem::DuplicateNode {
            node_a,
            node_b,
            location,
        });
    }

    fn report_invalid_location(&mut self, way_id: OsmId, node_id: OsmId) {
        self.push(Problem::InvalidLocation { way_id, node_id });
    }

    fn report_duplicate_segment(&mut self, start: Location, end: Location) {
        self.push(Problem::DuplicateSegment { start, end });
    }

    fn report_ring_not_closed(&mut self, location: Location) {
        self.push(Problem::RingNotClosed { location });
    }

    fn report_role_should_be_outer(&mut self, way_id: OsmId, _start: Location, _end: Location) {
        self.push(Problem::RoleShouldBeOuter { way_id });
    }

    fn report_role_should_be_inner(&mut self, way_id: OsmId, _start: Location, _end: Location) {
        self.push(Problem::RoleShouldBeInner { way_id });
    }

    fn report_way(&mut self, way: &Way) {
        self.push(Problem::Way { way_id: way.id });
    }

    fn report_inner_with_same_tags(&mut self, way: &Way) {
        self.push(Problem::InnerWithSameTags { way_id: way.id });
    }
}
