//! Default geometry collaborators of the assembler: extracting segments from ways and
//! linking them into rings.

pub mod rings;
pub mod segments;

pub use rings::{Ring, RingAssembler, RingBuilder};
pub use segments::{NodeRefSegment, Role, SegmentExtractor, SegmentList};
