use std::collections::HashMap;

use serde::Deserialize;

use self::osm::{ItemType, OsmId, Relation, Way};

pub mod area;
pub mod osm;

/// Index of a way inside the slice of ways handed to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WayIdx(pub usize);

/// A relation member whose way could be found. Members referring to missing ways
/// never make it into this list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMember {
    pub role: String,
    pub way: WayIdx,
}

impl ResolvedMember {
    pub fn new(role: &str, way: WayIdx) -> Self {
        ResolvedMember {
            role: role.to_string(),
            way,
        }
    }
}

#[derive(Deserialize)]
struct RawOsmData {
    #[serde(default)]
    ways: Vec<Way>,
    #[serde(default)]
    relations: Vec<Relation>,
}

/// Map data the areas are assembled from. Owns all ways so that relations can refer
/// to them by index.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(from = "RawOsmData")]
pub struct OsmData {
    pub ways: Vec<Way>,
    pub relations: Vec<Relation>,
    way_index: HashMap<OsmId, WayIdx>,
}

impl From<RawOsmData> for OsmData {
    fn from(value: RawOsmData) -> Self {
        OsmData::new(value.ways, value.relations)
    }
}

impl OsmData {
    pub fn new(ways: Vec<Way>, relations: Vec<Relation>) -> Self {
        let way_index = ways
            .iter()
            .enumerate()
            .map(|(idx, way)| (way.id, WayIdx(idx)))
            .collect();
        OsmData {
            ways,
            relations,
            way_index,
        }
    }

    pub fn way_idx(&self, id: OsmId) -> Option<WayIdx> {
        self.way_index.get(&id).copied()
    }

    pub fn way(&self, idx: WayIdx) -> &Way {
        &self.ways[idx.0]
    }

    /// Way members of the relation that are present in this data set, in member order.
    pub fn resolve_members(&self, relation: &Relation) -> Vec<ResolvedMember> {
        relation
            .members
            .iter()
            .filter(|member| member.member_type == ItemType::Way)
            .filter_map(|member| {
                self.way_idx(member.id)
                    .map(|way| ResolvedMember::new(&member.role, way))
            })
            .collect()
    }
}
