#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Out of memory: {size} bytes aligned to {align}")]
    OutOfMemory { size: usize, align: usize },

    #[error("Invalid layout: {size} bytes aligned to {align}")]
    InvalidLayout { size: usize, align: usize },

    #[error("Memory globals already initialized")]
    AlreadyInitialized,

    #[error("Memory globals not initialized")]
    NotInitialized,

    #[error("Leaked {bytes} bytes")]
    Leaked { bytes: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
