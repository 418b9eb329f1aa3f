use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Counters collected while assembling areas. Stats of separate assemblies are
/// combined by adding them up.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct AreaStats {
    pub from_ways: u64,
    pub from_relations: u64,
    pub member_ways: u64,
    pub short_ways: u64,
    pub duplicate_nodes: u64,
    pub duplicate_ways: u64,
    pub duplicate_segments: u64,
    pub invalid_locations: u64,
    pub open_rings: u64,
    pub outer_rings: u64,
    pub inner_rings: u64,
    pub no_way_in_mp_relation: u64,
    pub single_way_in_mp_relation: u64,
    pub no_tags_on_relation: u64,
    pub inner_with_same_tags: u64,
    pub wrong_role: u64,
}

impl AreaStats {
    fn fields(&self) -> [(&'static str, u64); 16] {
        [
            ("from_ways", self.from_ways),
            ("from_relations", self.from_relations),
            ("member_ways", self.member_ways),
            ("short_ways", self.short_ways),
            ("duplicate_nodes", self.duplicate_nodes),
            ("duplicate_ways", self.duplicate_ways),
            ("duplicate_segments", self.duplicate_segments),
            ("invalid_locations", self.invalid_locations),
            ("open_rings", self.open_rings),
            ("outer_rings", self.outer_rings),
            ("inner_rings", self.inner_rings),
            ("no_way_in_mp_relation", self.no_way_in_mp_relation),
            ("single_way_in_mp_relation", self.single_way_in_mp_relation),
            ("no_tags_on_relation", self.no_tags_on_relation),
            ("inner_with_same_tags", self.inner_with_same_tags),
            ("wrong_role", self.wrong_role),
        ]
    }

    /// Number of problems with the geometry. Ways involved in one are worth reporting.
    pub fn geometry_problems(&self) -> u64 {
        self.duplicate_nodes
            + self.duplicate_segments
            + self.open_rings
            + self.short_ways
            + self.wrong_role
    }
}

impl AddAssign for AreaStats {
    fn add_assign(&mut self, other: Self) {
        self.from_ways += other.from_ways;
        self.from_relations += other.from_relations;
        self.member_ways += other.member_ways;
        self.short_ways += other.short_ways;
        self.duplicate_nodes += other.duplicate_nodes;
        self.duplicate_ways += other.duplicate_ways;
        self.duplicate_segments += other.duplicate_segments;
        self.invalid_locations += other.invalid_locations;
        self.open_rings += other.open_rings;
        self.outer_rings += other.outer_rings;
        self.inner_rings += other.inner_rings;
        self.no_way_in_mp_relation += other.no_way_in_mp_relation;
        self.single_way_in_mp_relation += other.single_way_in_mp_relation;
        self.no_tags_on_relation += other.no_tags_on_relation;
        self.inner_with_same_tags += other.inner_with_same_tags;
        self.wrong_role += other.wrong_role;
    }
}

impl Add for AreaStats {
    type Output = AreaStats;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}

impl Sum for AreaStats {
    fn sum<I: Iterator<Item = AreaStats>>(iter: I) -> Self {
        iter.fold(AreaStats::default(), Add::add)
    }
}

impl fmt::Display for AreaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.fields() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        Ok(())
    }
}
