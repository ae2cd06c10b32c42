#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Allocation failed: {0}")]
    Alloc(#[from] foundation_alloc::Error),

    #[error("Capacity overflow")]
    CapacityOverflow,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
