use super::osm::{ItemType, Location, OsmId, TagList};

/// Ids of areas are derived from the object they were built from: ways get even ids,
/// relations odd ones. Negative object ids give negative area ids. `None` if the
/// area id doesn't fit into an `OsmId`.
pub fn object_id_to_area_id(id: OsmId, item_type: ItemType) -> Option<OsmId> {
    let mut area_id = id.checked_abs()?.checked_mul(2)?;
    if item_type == ItemType::Relation {
        area_id = area_id.checked_add(1)?;
    }
    if id < 0 {
        Some(-area_id)
    } else {
        Some(area_id)
    }
}

pub fn area_id_to_object_id(area_id: OsmId) -> OsmId {
    area_id / 2
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaSource {
    Way,
    Relation,
}

impl From<AreaSource> for ItemType {
    fn from(value: AreaSource) -> Self {
        match value {
            AreaSource::Way => ItemType::Way,
            AreaSource::Relation => ItemType::Relation,
        }
    }
}

/// A closed ring, first and last location are the same.
pub type RingPath = Vec<Location>;

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq)]
pub struct OuterRing {
    pub nodes: RingPath,
    pub inner_rings: Vec<RingPath>,
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq)]
pub struct Area {
    pub id: OsmId,
    pub source: AreaSource,
    pub source_id: OsmId,
    pub tags: TagList,
    pub outer_rings: Vec<OuterRing>,
}

impl Area {
    /// Empty area for the object, `None` if its id is too large to get an area id.
    pub fn from_object(source: AreaSource, source_id: OsmId) -> Option<Self> {
        Some(Area {
            id: object_id_to_area_id(source_id, source.into())?,
            source,
            source_id,
            tags: TagList::new(),
            outer_rings: Vec::new(),
        })
    }

    pub fn from_way(way_id: OsmId) -> Option<Self> {
        Area::from_object(AreaSource::Way, way_id)
    }

    pub fn from_relation(relation_id: OsmId) -> Option<Self> {
        Area::from_object(AreaSource::Relation, relation_id)
    }

    /// An area without rings is still emitted when empty areas are enabled.
    pub fn is_empty(&self) -> bool {
        self.outer_rings.is_empty()
    }

    pub fn is_multipolygon(&self) -> bool {
        self.outer_rings.len() > 1
    }

    /// Number of outer and inner rings.
    pub fn num_rings(&self) -> (usize, usize) {
        let inner = self
            .outer_rings
            .iter()
            .map(|ring| ring.inner_rings.len())
            .sum();
        (self.outer_rings.len(), inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_ids_encode_source_type() {
        assert_eq!(object_id_to_area_id(17, ItemType::Way), Some(34));
        assert_eq!(object_id_to_area_id(17, ItemType::Relation), Some(35));
        assert_eq!(object_id_to_area_id(-17, ItemType::Way), Some(-34));
        assert_eq!(object_id_to_area_id(-17, ItemType::Relation), Some(-35));
        assert_eq!(area_id_to_object_id(35), 17);
        assert_eq!(area_id_to_object_id(-35), -17);
    }

    #[test]
    fn ids_without_room_for_an_area_id() {
        let largest = (OsmId::MAX - 1) / 2;
        assert_eq!(object_id_to_area_id(largest, ItemType::Relation), Some(OsmId::MAX));
        assert_eq!(object_id_to_area_id(-largest, ItemType::Way), Some(-(OsmId::MAX - 1)));
        assert_eq!(object_id_to_area_id(largest + 1, ItemType::Way), None);
        assert_eq!(object_id_to_area_id(OsmId::MIN, ItemType::Way), None);
        assert!(Area::from_way(OsmId::MAX).is_none());
    }

    #[test]
    fn ring_counts() {
        let mut area = Area::from_relation(5).unwrap();
        assert!(area.is_empty());
        area.outer_rings.push(OuterRing {
            nodes: vec![],
            inner_rings: vec![vec![], vec![]],
        });
        area.outer_rings.push(OuterRing {
            nodes: vec![],
            inner_rings: vec![],
        });
        assert!(area.is_multipolygon());
        assert_eq!(area.num_rings(), (2, 2));
        assert_eq!(area.id, 11);
    }
}
