use std::collections::HashSet;

use crate::data::osm::{Location, NodeRef, Way};
use crate::data::{ResolvedMember, WayIdx};
use crate::problem::ProblemReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Empty,
    Outer,
    Inner,
    Other,
}

impl Role {
    pub fn from_member_role(role: &str) -> Self {
        match role {
            "" => Role::Empty,
            "outer" => Role::Outer,
            "inner" => Role::Inner,
            _ => Role::Other,
        }
    }
}

/// Segment between two consecutive nodes of a way, remembering which way it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRefSegment {
    pub first: NodeRef,
    pub second: NodeRef,
    pub role: Role,
    pub way: WayIdx,
}

impl NodeRefSegment {
    pub fn new(first: NodeRef, second: NodeRef, role: Role, way: WayIdx) -> Self {
        NodeRefSegment {
            first,
            second,
            role,
            way,
        }
    }

    /// End locations, smaller one first. Two segments with the same key cover the same
    /// stretch no matter their direction.
    pub fn key(&self) -> (Location, Location) {
        let (a, b) = (self.first.location, self.second.location);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Turns the node lists of ways into segments.
pub trait SegmentExtractor: Default {
    /// Extracts the segments of a single way. Returns the number of nodes with
    /// invalid locations, those are left out.
    fn extract_segments_from_way(
        &mut self,
        reporter: Option<&mut dyn ProblemReporter>,
        duplicate_nodes: &mut u64,
        way: &Way,
        way_idx: WayIdx,
    ) -> u64;

    /// Extracts the segments of all member ways of a relation. A way listed more than
    /// once is only used the first time.
    fn extract_segments_from_ways(
        &mut self,
        reporter: Option<&mut dyn ProblemReporter>,
        duplicate_nodes: &mut u64,
        duplicate_ways: &mut u64,
        members: &[ResolvedMember],
        ways: &[Way],
    ) -> u64;

    fn segments(&self) -> &[NodeRefSegment];

    fn len(&self) -> usize {
        self.segments().len()
    }

    fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SegmentList {
    segments: Vec<NodeRefSegment>,
}

impl SegmentList {
    pub fn new() -> Self {
        SegmentList::default()
    }

    fn extract(
        &mut self,
        reporter: &mut Option<&mut dyn ProblemReporter>,
        duplicate_nodes: &mut u64,
        way: &Way,
        way_idx: WayIdx,
        role: Role,
    ) -> u64 {
        let mut invalid_locations = 0;
        let mut last: Option<NodeRef> = None;

        for node in &way.nodes {
            if !node.location.is_valid() {
                invalid_locations += 1;
                if let Some(reporter) = reporter.as_mut() {
                    reporter.report_invalid_location(way.id, node.id);
                }
                continue;
            }

            if let Some(previous) = last {
                if previous.location == node.location {
                    *duplicate_nodes += 1;
                    if let Some(reporter) = reporter.as_mut() {
                        reporter.report_duplicate_node(previous.id, node.id, node.location);
                    }
                } else {
                    self.segments
                        .push(NodeRefSegment::new(previous, *node, role, way_idx));
                }
            }
            last = Some(*node);
        }

        invalid_locations
    }
}

impl SegmentExtractor for SegmentList {
    fn extract_segments_from_way(
        &mut self,
        mut reporter: Option<&mut dyn ProblemReporter>,
        duplicate_nodes: &mut u64,
        way: &Way,
        way_idx: WayIdx,
    ) -> u64 {
        self.extract(&mut reporter, duplicate_nodes, way, way_idx, Role::Outer)
    }

    fn extract_segments_from_ways(
        &mut self,
        mut reporter: Option<&mut dyn ProblemReporter>,
        duplicate_nodes: &mut u64,
        duplicate_ways: &mut u64,
        members: &[ResolvedMember],
        ways: &[Way],
    ) -> u64 {
        let mut seen: HashSet<WayIdx> = HashSet::new();
        let mut invalid_locations = 0;

        for member in members {
            if !seen.insert(member.way) {
                *duplicate_ways += 1;
                continue;
            }
            invalid_locations += self.extract(
                &mut reporter,
                duplicate_nodes,
                &ways[member.way.0],
                member.way,
                Role::from_member_role(&member.role),
            );
        }

        invalid_locations
    }

    fn segments(&self) -> &[NodeRefSegment] {
        &self.segments
    }
}
