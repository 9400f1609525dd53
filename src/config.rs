use crate::types::{Noaa1bError, Noaa1bResult};
use serde::{Deserialize, Serialize};

/// Default tile cache budget per grid (4 MiB)
pub const DEFAULT_CACHE_SIZE: usize = 4 * 1024 * 1024;

/// Reader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Data is little-endian
    pub byte_swapped: bool,
    /// Tile cache budget in bytes for each grid
    pub cache_size_bytes: usize,
    /// Scan lines per tile
    pub tile_rows: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            byte_swapped: false,
            cache_size_bytes: DEFAULT_CACHE_SIZE,
            tile_rows: 1,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_byte_swapped(mut self, byte_swapped: bool) -> Self {
        self.byte_swapped = byte_swapped;
        self
    }

    pub fn with_cache_size_bytes(mut self, cache_size_bytes: usize) -> Self {
        self.cache_size_bytes = cache_size_bytes;
        self
    }

    pub fn with_tile_rows(mut self, tile_rows: usize) -> Self {
        self.tile_rows = tile_rows;
        self
    }

    pub fn validate(&self) -> Noaa1bResult<()> {
        if self.cache_size_bytes == 0 {
            return Err(Noaa1bError::Config(
                "cache_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.tile_rows == 0 {
            return Err(Noaa1bError::Config(
                "tile_rows must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
