use crate::data::area::Area;

/// Destination for assembled areas. Writes are tentative until `commit` is
/// called; `rollback` throws the pending area away.
pub trait OutputSink {
    /// Starts a tentative write. Replaces an earlier pending area that was
    /// neither committed nor rolled back. Returns the offset the area will
    /// have once committed.
    fn write(&mut self, area: Area) -> usize;

    fn commit(&mut self);

    fn rollback(&mut self);

    /// Number of committed areas, which is also the offset of the next write.
    fn committed(&self) -> usize;

    /// Reads back a committed area or the pending one.
    fn get(&self, offset: usize) -> Option<&Area>;
}

#[derive(Debug, Default)]
pub struct OutputBuffer {
    areas: Vec<Area>,
    pending: Option<Area>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        OutputBuffer::default()
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn into_areas(self) -> Vec<Area> {
        self.areas
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl OutputSink for OutputBuffer {
    fn write(&mut self, area: Area) -> usize {
        self.pending = Some(area);
        self.areas.len()
    }

    fn commit(&mut self) {
        if let Some(area) = self.pending.take() {
            self.areas.push(area);
        }
    }

    fn rollback(&mut self) {
        self.pending = None;
    }

    fn committed(&self) -> usize {
        self.areas.len()
    }

    fn get(&self, offset: usize) -> Option<&Area> {
        if offset == self.areas.len() {
            self.pending.as_ref()
        } else {
            self.areas.get(offset)
        }
    }
}
