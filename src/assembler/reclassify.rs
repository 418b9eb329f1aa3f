use crate::data::osm::{Tag, TagList, Way};
use crate::data::{ResolvedMember, WayIdx};

use super::tags::KeyFilter;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InnerRings {
    /// Inner ways tagged differently from the area. They get areas of their own.
    pub needs_area: Vec<WayIdx>,
    /// Inner ways with the same tags as the area, these are plain holes.
    pub same_tags: Vec<WayIdx>,
}

/// Sorts closed, tagged inner members of a relation into plain holes and ways that
/// describe a different feature. The caller skips this entirely when a member had
/// the wrong role.
pub fn classify_inner_rings(
    members: &[ResolvedMember],
    ways: &[Way],
    area_tags: &TagList,
    filter: &KeyFilter,
) -> InnerRings {
    let area_filtered = sorted_filtered(area_tags, filter);

    let mut result = InnerRings::default();
    for member in members.iter().filter(|member| member.role == "inner") {
        let way = &ways[member.way.0];
        if way.nodes.is_empty() || !way.is_closed() || way.tags.is_empty() {
            continue;
        }

        let way_filtered = sorted_filtered(&way.tags, filter);
        if way_filtered.is_empty() {
            continue;
        }

        if way_filtered == area_filtered {
            result.same_tags.push(member.way);
        } else {
            result.needs_area.push(member.way);
        }
    }
    result
}

fn sorted_filtered<'a>(tags: &'a TagList, filter: &'a KeyFilter) -> Vec<&'a Tag> {
    let mut filtered: Vec<&Tag> = filter.filtered(tags).collect();
    filtered.sort();
    filtered
}
