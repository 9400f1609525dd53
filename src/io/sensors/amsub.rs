use super::{unpack_strided, SensorFormat};
use crate::core::instrument::Instrument;
use crate::io::fields::{FieldLayout, FieldView};
use crate::types::Noaa1bResult;

const SENSOR_WORDS: usize = 6;

/// AMSU-B record format
#[derive(Debug, Clone, Copy)]
pub struct AmsuB;

impl SensorFormat for AmsuB {
    fn instrument(&self) -> Instrument {
        Instrument::AmsuB
    }

    fn header_layout(&self) -> &'static str {
        "amsub_header"
    }

    fn record_layout(&self) -> &'static str {
        "amsub_record"
    }

    fn record_size(&self) -> usize {
        2560
    }

    // AMSU-B channels continue the AMSU-A numbering
    fn field_prefix(&self, channel: usize) -> String {
        format!("ch{}", channel + 16)
    }

    fn sensor_fields(&self) -> &'static [&'static str] {
        &["amsubData"]
    }

    fn unpack_counts(&self, layout: &FieldLayout, view: &FieldView) -> Noaa1bResult<Vec<i32>> {
        let words = layout.get_long_array("amsubData", view)?;
        let samples = self.descriptor().sample_count();
        let channels = self.descriptor().channel_count();
        let mut counts = vec![0i32; samples * channels];
        unpack_strided(&words, samples, channels, SENSOR_WORDS, 1, &mut counts);
        Ok(counts)
    }
}
