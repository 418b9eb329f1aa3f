use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::assembler::stats::AreaStats;
use crate::data::osm::{Location, Way};
use crate::data::WayIdx;
use crate::problem::ProblemReporter;

use super::segments::{NodeRefSegment, Role};

/// A closed ring of locations, first and last location are the same.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    locations: Vec<Location>,
    segments: Vec<NodeRefSegment>,
    outer: bool,
    /// Index of the outer ring an inner ring sits in.
    parent: Option<usize>,
    ways: BTreeSet<WayIdx>,
}

impl Ring {
    fn new(locations: Vec<Location>, segments: Vec<NodeRefSegment>) -> Self {
        let ways = segments.iter().map(|segment| segment.way).collect();
        Ring {
            locations,
            segments,
            outer: true,
            parent: None,
            ways,
        }
    }

    pub fn is_outer(&self) -> bool {
        self.outer
    }

    pub fn is_inner(&self) -> bool {
        !self.outer
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn get_ways(&self, ways: &mut BTreeSet<WayIdx>) {
        ways.extend(self.ways.iter().copied());
    }

    /// Twice the signed area, positive for counter-clockwise rings.
    fn signed_area(&self) -> i128 {
        self.locations
            .windows(2)
            .map(|pair| {
                let (a, b) = (pair[0], pair[1]);
                i128::from(a.x()) * i128::from(b.y()) - i128::from(b.x()) * i128::from(a.y())
            })
            .sum()
    }

    fn is_cw(&self) -> bool {
        self.signed_area() < 0
    }

    fn reverse(&mut self) {
        self.locations.reverse();
    }

    fn probe_point(&self) -> (f64, f64) {
        let (a, b) = (self.locations[0], self.locations[1]);
        (
            (f64::from(a.x()) + f64::from(b.x())) / 2.0,
            (f64::from(a.y()) + f64::from(b.y())) / 2.0,
        )
    }

    fn contains_point(&self, (px, py): (f64, f64)) -> bool {
        let mut inside = false;
        for pair in self.locations.windows(2) {
            let (ax, ay) = (f64::from(pair[0].x()), f64::from(pair[0].y()));
            let (bx, by) = (f64::from(pair[1].x()), f64::from(pair[1].y()));
            if (ay > py) != (by > py) && px < (bx - ax) * (py - ay) / (by - ay) + ax {
                inside = !inside;
            }
        }
        inside
    }
}

/// Builds closed rings out of segments and works out which rings are holes.
pub trait RingBuilder: Default {
    /// Returns true if every segment ended up in a closed ring and there is at least
    /// one outer ring.
    fn build_rings(
        &mut self,
        segments: &[NodeRefSegment],
        ways: &[Way],
        check_roles: bool,
        reporter: Option<&mut dyn ProblemReporter>,
        stats: &mut AreaStats,
    ) -> bool;

    /// Rings found by the last successful `build_rings`. Inner rings refer to their
    /// outer ring by index into this slice.
    fn rings(&self) -> &[Ring];
}

#[derive(Debug, Default)]
pub struct RingAssembler {
    rings: Vec<Ring>,
}

impl RingAssembler {
    pub fn new() -> Self {
        RingAssembler::default()
    }

    /// Removes pairs of segments covering the same stretch, they cancel each other out.
    fn erase_duplicate_segments(
        segments: &[NodeRefSegment],
        reporter: &mut Option<&mut dyn ProblemReporter>,
        stats: &mut AreaStats,
    ) -> Vec<NodeRefSegment> {
        let mut sorted = segments.to_vec();
        sorted.sort_by_key(|segment| segment.key());

        let mut kept = Vec::with_capacity(sorted.len());
        let mut idx = 0;
        while idx < sorted.len() {
            if idx + 1 < sorted.len() && sorted[idx].key() == sorted[idx + 1].key() {
                stats.duplicate_segments += 1;
                if let Some(reporter) = reporter.as_mut() {
                    let (start, end) = sorted[idx].key();
                    reporter.report_duplicate_segment(start, end);
                }
                idx += 2;
            } else {
                kept.push(sorted[idx]);
                idx += 1;
            }
        }
        kept
    }

    // Chains that don't get back to where they started are open rings.
    fn link_segments(
        segments: &[NodeRefSegment],
        reporter: &mut Option<&mut dyn ProblemReporter>,
        stats: &mut AreaStats,
    ) -> Vec<Ring> {
        let mut by_location: HashMap<Location, Vec<usize>> = HashMap::new();
        for (idx, segment) in segments.iter().enumerate() {
            by_location.entry(segment.first.location).or_default().push(idx);
            by_location.entry(segment.second.location).or_default().push(idx);
        }

        let mut used = vec![false; segments.len()];
        let mut rings = Vec::new();

        for start_idx in 0..segments.len() {
            if used[start_idx] {
                continue;
            }
            used[start_idx] = true;

            let start = segments[start_idx].first.location;
            let mut current = segments[start_idx].second.location;
            let mut locations = vec![start, current];
            let mut ring_segments = vec![segments[start_idx]];

            while current != start {
                let next = by_location
                    .get(&current)
                    .and_then(|candidates| candidates.iter().copied().find(|idx| !used[*idx]));
                let Some(next) = next else {
                    break;
                };
                used[next] = true;
                let segment = segments[next];
                current = if segment.first.location == current {
                    segment.second.location
                } else {
                    segment.first.location
                };
                locations.push(current);
                ring_segments.push(segment);
            }

            if current == start {
                rings.push(Ring::new(locations, ring_segments));
            } else {
                stats.open_rings += 1;
                if let Some(reporter) = reporter.as_mut() {
                    reporter.report_ring_not_closed(start);
                    reporter.report_ring_not_closed(current);
                }
            }
        }

        rings
    }

    /// Rings inside an odd number of other rings are inner rings. Each inner ring
    /// belongs to the smallest ring around it.
    fn classify_rings(rings: &mut [Ring]) {
        let areas: Vec<i128> = rings.iter().map(|ring| ring.signed_area().abs()).collect();

        let mut classification = Vec::with_capacity(rings.len());
        for (idx, ring) in rings.iter().enumerate() {
            let probe = ring.probe_point();
            let containers: Vec<usize> = rings
                .iter()
                .enumerate()
                .filter(|(other_idx, other)| *other_idx != idx && other.contains_point(probe))
                .map(|(other_idx, _)| other_idx)
                .collect();
            let outer = containers.len() % 2 == 0;
            let parent = if outer {
                None
            } else {
                containers.iter().copied().min_by_key(|other| areas[*other])
            };
            classification.push((outer, parent));
        }

        for (ring, (outer, parent)) in rings.iter_mut().zip(classification) {
            ring.outer = outer;
            ring.parent = parent;
            if ring.outer == ring.is_cw() {
                ring.reverse();
            }
        }
    }

    fn check_roles(
        rings: &[Ring],
        ways: &[Way],
        check_roles: bool,
        reporter: &mut Option<&mut dyn ProblemReporter>,
        stats: &mut AreaStats,
    ) {
        for ring in rings {
            for segment in &ring.segments {
                let wrong = match segment.role {
                    Role::Empty => false,
                    Role::Outer => ring.is_inner(),
                    Role::Inner => ring.is_outer(),
                    Role::Other => true,
                };
                if !wrong {
                    continue;
                }
                stats.wrong_role += 1;
                if !check_roles {
                    continue;
                }
                if let Some(reporter) = reporter.as_mut() {
                    let way_id = ways[segment.way.0].id;
                    let (start, end) = (segment.first.location, segment.second.location);
                    if ring.is_outer() {
                        reporter.report_role_should_be_outer(way_id, start, end);
                    } else {
                        reporter.report_role_should_be_inner(way_id, start, end);
                    }
                }
            }
        }
    }
}

impl RingBuilder for RingAssembler {
    fn build_rings(
        &mut self,
        segments: &[NodeRefSegment],
        ways: &[Way],
        check_roles: bool,
        mut reporter: Option<&mut dyn ProblemReporter>,
        stats: &mut AreaStats,
    ) -> bool {
        self.rings.clear();

        let segments = Self::erase_duplicate_segments(segments, &mut reporter, stats);
        let open_rings_before = stats.open_rings;
        let mut rings = Self::link_segments(&segments, &mut reporter, stats);
        if stats.open_rings > open_rings_before {
            debug!(open_rings = stats.open_rings - open_rings_before; "Found open rings");
            return false;
        }

        Self::classify_rings(&mut rings);
        Self::check_roles(&rings, ways, check_roles, &mut reporter, stats);

        let outer = rings.iter().filter(|ring| ring.is_outer()).count();
        let inner = rings.len() - outer;
        stats.outer_rings += outer as u64;
        stats.inner_rings += inner as u64;

        if outer == 0 {
            return false;
        }
        self.rings = rings;
        true
    }

    fn rings(&self) -> &[Ring] {
        &self.rings
    }
}
