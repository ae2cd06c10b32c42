use crate::{error::Result, globals};

/// Settings for the process-wide default allocators.
#[derive(Debug, Clone)]
pub struct MemoryOptions {
    pub(crate) scratch_buffer_size: usize,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            scratch_buffer_size: 4 * 1024 * 1024,
        }
    }
}

impl MemoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ring size of the default scratch allocator, in bytes.
    pub fn scratch_buffer_size(&mut self, size: usize) -> &mut Self {
        self.scratch_buffer_size = size;
        self
    }

    /// Sets up the process-wide allocators with these settings.
    pub fn init(&self) -> Result<()> {
        globals::init(self)
    }
}
