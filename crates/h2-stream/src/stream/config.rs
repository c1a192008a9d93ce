/// Threshold meaning "never accumulate": no queue ever grows this long.
pub const ACCUMULATION_DISABLED: usize = usize::MAX;

/// Read-path tuning for a [`DataStream`](crate::stream::DataStream).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    min_accum_frames: usize,
}

impl StreamConfig {
    pub const fn new() -> Self {
        Self { min_accum_frames: ACCUMULATION_DISABLED }
    }

    /// Coalesce buffered DATA frames once at least `frames` are queued.
    ///
    /// A threshold of 0 behaves like 1: any backlog is drained and merged.
    ///
    /// Merging changes how an end-of-stream DATA frame that is directly
    /// followed by trailers comes out. Read one frame at a time, the DATA frame
    /// carries end-of-stream and closes the stream, so the trailers are never
    /// read. Drained together, the merged chunk has end-of-stream unset and the
    /// trailers come on the next read.
    #[must_use]
    pub const fn with_min_accum_frames(mut self, frames: usize) -> Self {
        self.min_accum_frames = frames;
        self
    }

    #[must_use]
    pub const fn accumulation_disabled(mut self) -> Self {
        self.min_accum_frames = ACCUMULATION_DISABLED;
        self
    }

    pub const fn min_accum_frames(&self) -> usize {
        self.min_accum_frames
    }

    pub const fn is_accumulation_enabled(&self) -> bool {
        self.min_accum_frames != ACCUMULATION_DISABLED
    }

    /// Whether a backlog of `queued` frames is enough to drain and merge right away.
    #[inline]
    pub(crate) fn should_drain(&self, queued: usize) -> bool {
        queued > 0 && queued >= self.min_accum_frames
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}
