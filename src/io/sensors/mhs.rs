use super::{unpack_strided, SensorFormat};
use crate::core::instrument::Instrument;
use crate::io::fields::{FieldLayout, FieldView};
use crate::types::Noaa1bResult;

const SENSOR_WORDS: usize = 6;

/// MHS record format
#[derive(Debug, Clone, Copy)]
pub struct Mhs;

impl SensorFormat for Mhs {
    fn instrument(&self) -> Instrument {
        Instrument::Mhs
    }

    fn header_layout(&self) -> &'static str {
        "mhs_header"
    }

    fn record_layout(&self) -> &'static str {
        "mhs_record"
    }

    fn record_size(&self) -> usize {
        3072
    }

    fn field_prefix(&self, channel: usize) -> String {
        format!("chH{}", channel + 1)
    }

    fn sensor_fields(&self) -> &'static [&'static str] {
        &["mhsData"]
    }

    fn unpack_counts(&self, layout: &FieldLayout, view: &FieldView) -> Noaa1bResult<Vec<i32>> {
        let words = layout.get_long_array("mhsData", view)?;
        let samples = self.descriptor().sample_count();
        let channels = self.descriptor().channel_count();
        let mut counts = vec![0i32; samples * channels];
        unpack_strided(&words, samples, channels, SENSOR_WORDS, 1, &mut counts);
        Ok(counts)
    }
}
