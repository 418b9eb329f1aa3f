use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type OsmId = i64;

/// Fixed-point coordinates are stored in units of 1e-7 degrees.
pub const COORDINATE_PRECISION: f64 = 10_000_000.0;

const UNDEFINED_COORDINATE: i32 = i32::MAX;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Node,
    Way,
    Relation,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemType::Node => "node",
            ItemType::Way => "way",
            ItemType::Relation => "relation",
        };
        f.write_str(name)
    }
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    x: i32,
    y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Location { x, y }
    }

    pub const fn undefined() -> Self {
        Location {
            x: UNDEFINED_COORDINATE,
            y: UNDEFINED_COORDINATE,
        }
    }

    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        match (to_fixed(lon), to_fixed(lat)) {
            (Some(x), Some(y)) => Location { x, y },
            _ => Location::undefined(),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn lon(&self) -> f64 {
        f64::from(self.x) / COORDINATE_PRECISION
    }

    pub fn lat(&self) -> f64 {
        f64::from(self.y) / COORDINATE_PRECISION
    }

    pub fn is_defined(&self) -> bool {
        self.x != UNDEFINED_COORDINATE || self.y != UNDEFINED_COORDINATE
    }

    pub fn is_valid(&self) -> bool {
        let max_x = (180.0 * COORDINATE_PRECISION) as i32;
        let max_y = (90.0 * COORDINATE_PRECISION) as i32;
        (-max_x..=max_x).contains(&self.x) && (-max_y..=max_y).contains(&self.y)
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::undefined()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "({:.7},{:.7})", self.lon(), self.lat())
        } else {
            f.write_str("(undefined,undefined)")
        }
    }
}

fn to_fixed(degrees: f64) -> Option<i32> {
    let value = (degrees * COORDINATE_PRECISION).round();
    if value.is_finite() && value > f64::from(i32::MIN) && value < f64::from(i32::MAX) {
        Some(value as i32)
    } else {
        None
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
struct RawNodeRef {
    id: OsmId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
}

/// A node reference inside a way together with its resolved location.
/// Nodes whose location could not be resolved carry `Location::undefined()`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "RawNodeRef", into = "RawNodeRef")]
pub struct NodeRef {
    pub id: OsmId,
    pub location: Location,
}

impl NodeRef {
    pub fn new(id: OsmId, location: Location) -> Self {
        NodeRef { id, location }
    }
}

impl From<RawNodeRef> for NodeRef {
    fn from(value: RawNodeRef) -> Self {
        let location = match (value.lon, value.lat) {
            (Some(lon), Some(lat)) => Location::from_degrees(lon, lat),
            _ => Location::undefined(),
        };
        NodeRef {
            id: value.id,
            location,
        }
    }
}

impl From<NodeRef> for RawNodeRef {
    fn from(value: NodeRef) -> Self {
        let (lon, lat) = if value.location.is_defined() {
            (Some(value.location.lon()), Some(value.location.lat()))
        } else {
            (None, None)
        };
        RawNodeRef {
            id: value.id,
            lon,
            lat,
        }
    }
}

#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Self {
        Tag {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Ordered list of tags. In JSON it is written as a plain `{"key": "value"}` object.
#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct TagList {
    tags: Vec<Tag>,
}

impl TagList {
    pub fn new() -> Self {
        TagList::default()
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.tags.push(Tag::new(key, value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TagList {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        TagList {
            tags: iter
                .into_iter()
                .map(|(key, value)| Tag::new(key, value))
                .collect(),
        }
    }
}

impl FromIterator<Tag> for TagList {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        TagList {
            tags: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

impl From<BTreeMap<String, String>> for TagList {
    fn from(value: BTreeMap<String, String>) -> Self {
        TagList {
            tags: value
                .into_iter()
                .map(|(key, value)| Tag { key, value })
                .collect(),
        }
    }
}

impl From<TagList> for BTreeMap<String, String> {
    fn from(value: TagList) -> Self {
        value
            .tags
            .into_iter()
            .map(|tag| (tag.key, tag.value))
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    #[serde(default)]
    pub nodes: Vec<NodeRef>,
    #[serde(default)]
    pub tags: TagList,
}

impl Way {
    /// First and last node are the same node. A way without nodes is never closed.
    pub fn ends_have_same_id(&self) -> bool {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => first.id == last.id,
            _ => false,
        }
    }

    pub fn ends_have_same_location(&self) -> bool {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => first.location == last.location,
            _ => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.ends_have_same_id()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RelationMember {
    #[serde(rename = "type")]
    pub member_type: ItemType,
    #[serde(rename = "ref")]
    pub id: OsmId,
    #[serde(default)]
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: OsmId,
    #[serde(default)]
    pub tags: TagList,
    #[serde(default)]
    pub members: Vec<RelationMember>,
}
