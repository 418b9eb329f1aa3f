use std::collections::BTreeMap;

use crate::data::osm::{Tag, TagList, Way};

/// Keys that say nothing about what a multipolygon is.
pub const MULTIPOLYGON_IGNORED_KEYS: &[&str] = &[
    "type",
    "created_by",
    "source",
    "note",
    "test:id",
    "test:section",
];

/// Accepts every tag whose key is not in the ignore list.
#[derive(Debug, Clone, Copy)]
pub struct KeyFilter {
    ignored: &'static [&'static str],
}

impl KeyFilter {
    pub const fn new(ignored: &'static [&'static str]) -> Self {
        KeyFilter { ignored }
    }

    pub const fn multipolygon() -> Self {
        KeyFilter::new(MULTIPOLYGON_IGNORED_KEYS)
    }

    pub fn matches(&self, tag: &Tag) -> bool {
        !self.ignored.iter().any(|key| *key == tag.key)
    }

    pub fn count(&self, tags: &TagList) -> usize {
        self.filtered(tags).count()
    }

    pub fn filtered<'a>(&'a self, tags: &'a TagList) -> impl Iterator<Item = &'a Tag> + 'a {
        tags.iter().filter(move |tag| self.matches(tag))
    }
}

impl Default for KeyFilter {
    fn default() -> Self {
        KeyFilter::multipolygon()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    Relation,
    OuterWays,
}

/// Picks the tags for an area built from a relation. Relations with meaningful tags
/// of their own pass them on. Otherwise the tags come from the outer ways.
pub fn select_relation_tags(
    relation_tags: &TagList,
    outer_ways: &[&Way],
    keep_type_tag: bool,
    filter: &KeyFilter,
) -> (TagList, TagSource) {
    if filter.count(relation_tags) > 0 {
        let tags = if keep_type_tag {
            relation_tags.clone()
        } else {
            without_type(relation_tags)
        };
        return (tags, TagSource::Relation);
    }

    let tags = match outer_ways {
        [way] => way.tags.clone(),
        _ => common_tags(outer_ways),
    };
    (tags, TagSource::OuterWays)
}

pub fn without_type(tags: &TagList) -> TagList {
    tags.iter().filter(|tag| tag.key != "type").cloned().collect()
}

/// Key/value pairs found on every one of the ways, sorted by key and value.
/// No ignore filter is applied here.
pub fn common_tags(ways: &[&Way]) -> TagList {
    let mut counter: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for way in ways {
        for tag in &way.tags {
            *counter
                .entry((tag.key.as_str(), tag.value.as_str()))
                .or_insert(0) += 1;
        }
    }

    counter
        .into_iter()
        .filter(|(_, count)| *count == ways.len())
        .map(|(key_value, _)| key_value)
        .collect()
}
