//! Byte-level access to NOAA 1b files

pub mod fields;
pub mod archive;
pub mod header;
pub mod sensors;
pub mod record;
pub mod file;
pub mod cache;
pub mod grid;
pub mod reader;

pub use archive::{ArchiveHeader, ArchiveKind};
pub use header::DataHeader;
pub use record::{DataRecord, LocationData};
pub use file::{Noaa1bFile, RecordExtent};
pub use cache::{CacheStats, SharedCache, TileCache};
pub use grid::{SwathGrid, Tile, TileData, Tiling};
pub use reader::{Noaa1bReader, Variable};
