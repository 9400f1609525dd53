//! Per-instrument record formats
//!
//! Everything that differs between instruments beyond the field layout
//! itself: quality masks, how raw sensor words interleave into channels,
//! and the channel prefix used in coefficient field names.

pub mod amsua;
pub mod amsub;
pub mod mhs;
pub mod hirs4;

pub use amsua::AmsuA;
pub use amsub::AmsuB;
pub use mhs::Mhs;
pub use hirs4::Hirs4;

use crate::core::instrument::{Instrument, InstrumentDescriptor};
use crate::core::quality::QualityMasks;
use crate::io::fields::{FieldLayout, FieldView};
use crate::types::Noaa1bResult;

/// Bytes at the start of every record holding scan line, time and quality
pub const ATTRIBUTE_SIZE: usize = 32;

/// Instrument-specific decoding rules
pub trait SensorFormat: std::fmt::Debug + Send + Sync {
    fn instrument(&self) -> Instrument;

    /// Name of the embedded data header layout
    fn header_layout(&self) -> &'static str;

    /// Name of the embedded data record layout
    fn record_layout(&self) -> &'static str;

    /// Fixed size of the header and data records
    fn record_size(&self) -> usize;

    fn attribute_size(&self) -> usize {
        ATTRIBUTE_SIZE
    }

    fn masks(&self) -> QualityMasks {
        QualityMasks::for_instrument(self.instrument())
    }

    fn descriptor(&self) -> &'static InstrumentDescriptor {
        self.instrument().descriptor()
    }

    /// Field name prefix for a 0-based channel index
    fn field_prefix(&self, channel: usize) -> String;

    /// Raw sensor word fields read by `unpack_counts`
    fn sensor_fields(&self) -> &'static [&'static str];

    /// Counts as `samples x channels`, sample-major, in geographic order
    fn unpack_counts(&self, layout: &FieldLayout, view: &FieldView) -> Noaa1bResult<Vec<i32>>;

    /// Record fields every decoder needs
    fn required_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = [
            "scanLine",
            "scanYear",
            "scanDayOfYear",
            "scanTimeOfDay",
            "qualityIndicator",
            "calibrationProblem",
            "angles",
            "earthLocations",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if self.masks().require_earth_view {
            fields.push("scanType".to_string());
        }
        if self.masks().channel.is_some() {
            fields.push("calibrationQualityFlags".to_string());
        }
        fields.extend(self.sensor_fields().iter().map(|s| s.to_string()));
        for channel in 0..self.descriptor().channel_count() {
            let prefix = self.field_prefix(channel);
            for order in ["ZerothOrder", "FirstOrder", "SecondOrder"] {
                fields.push(format!("{}{}", prefix, order));
            }
        }
        fields
    }
}

/// Decoding rules for an instrument
pub fn sensor_format(instrument: Instrument) -> &'static dyn SensorFormat {
    match instrument {
        Instrument::AmsuA => &AmsuA,
        Instrument::AmsuB => &AmsuB,
        Instrument::Mhs => &Mhs,
        Instrument::Hirs4 => &Hirs4,
    }
}

/// Logical (geographic) position of a physical sample
#[inline]
pub fn reverse_sample(samples: usize, sample: usize) -> usize {
    samples - 1 - sample
}

/// Unpack instruments whose channels sit at a fixed offset within a
/// fixed-stride block of words per sample.
pub(crate) fn unpack_strided(
    words: &[i64],
    samples: usize,
    channels: usize,
    stride: usize,
    offset: usize,
    counts: &mut [i32],
) {
    for i in 0..samples {
        let base = i * stride + offset;
        let row = reverse_sample(samples, i) * channels;
        for j in 0..channels {
            counts[row + j] = (words[base + j] & 0xffff) as i32;
        }
    }
}
