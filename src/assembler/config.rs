use serde::{Deserialize, Serialize};

/// Options for the area assembler. Every field may be left out of the JSON config,
/// missing fields take the default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Verbosity of the assembler's debug log. 0 is silent.
    pub debug_level: u32,

    /// Report members whose role doesn't match the ring they ended up in.
    pub check_roles: bool,

    /// Emit areas with tags but without rings when the geometry is broken.
    pub create_empty_areas: bool,

    /// Create areas from multipolygon relations that carry their own tags.
    pub create_new_style_polygons: bool,

    /// Create areas from multipolygon relations whose tags live on the outer ways.
    pub create_old_style_polygons: bool,

    /// Create areas from closed ways.
    pub create_way_polygons: bool,

    /// Keep the `type` tag of relations on the area.
    pub keep_type_tag: bool,

    /// Build areas even if some nodes have invalid locations. Those nodes are skipped.
    pub ignore_invalid_locations: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        AssemblerConfig {
            debug_level: 0,
            check_roles: false,
            create_empty_areas: true,
            create_new_style_polygons: true,
            create_old_style_polygons: true,
            create_way_polygons: true,
            keep_type_tag: false,
            ignore_invalid_locations: false,
        }
    }
}
