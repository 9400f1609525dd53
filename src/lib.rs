//! noaa1b: decoder and calibrator for NOAA polar-orbiter 1b radiometer files
//!
//! Supports AMSU-A, AMSU-B, MHS and HIRS/4 level 1b data: archive header
//! detection, data header and scan record decoding, quality screening,
//! calibration to radiance, brightness temperature and albedo, and lazy
//! tiled access to the navigable part of the swath.

pub mod types;
pub mod config;
pub mod core;
pub mod io;

// Re-export main types and functions for easier access
pub use types::{
    ArchiveInfo, CalibrationType, FileMetadata, NavigationType, Noaa1bError, Noaa1bResult,
    VariableKind,
};

pub use config::ReaderConfig;
pub use crate::core::{ChannelCalibrator, Instrument, LineMap};
pub use io::{Noaa1bFile, Noaa1bReader, SwathGrid, TileData};
