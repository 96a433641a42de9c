use engine_core::AssetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("heightmap must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },

    #[error("heightmap needs at least 2x2 samples, got {0}x{0}")]
    TooSmall(usize),

    #[error("expected {expected} samples, got {actual}")]
    SampleCount { expected: usize, actual: usize },
}
