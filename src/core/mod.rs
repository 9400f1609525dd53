//! Core decoding logic independent of file access

pub mod instrument;
pub mod quality;
pub mod calibrate;
pub mod line_map;

// Re-export main types
pub use instrument::{Instrument, InstrumentDescriptor};
pub use quality::{QualityMasks, RecordQuality};
pub use calibrate::{ChannelCalibrator, CountCoefficients, TemperatureConstants};
pub use line_map::{LineEntry, LineMap, LineRun};
