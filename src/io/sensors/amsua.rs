use super::{reverse_sample, SensorFormat};
use crate::core::instrument::Instrument;
use crate::io::fields::{FieldLayout, FieldView};
use crate::types::Noaa1bResult;

/// Words per sample in the AMSU-A1 block (channels 3-15)
const SENSOR_WORDS_A1: usize = 17;

/// Words per sample in the AMSU-A2 block (channels 1-2)
const SENSOR_WORDS_A2: usize = 4;

/// AMSU-A record format
#[derive(Debug, Clone, Copy)]
pub struct AmsuA;

impl SensorFormat for AmsuA {
    fn instrument(&self) -> Instrument {
        Instrument::AmsuA
    }

    fn header_layout(&self) -> &'static str {
        "amsua_header"
    }

    fn record_layout(&self) -> &'static str {
        "amsua_record"
    }

    fn record_size(&self) -> usize {
        2560
    }

    fn field_prefix(&self, channel: usize) -> String {
        format!("ch{}", channel + 1)
    }

    fn sensor_fields(&self) -> &'static [&'static str] {
        &["amsua1Data", "amsua2Data"]
    }

    fn unpack_counts(&self, layout: &FieldLayout, view: &FieldView) -> Noaa1bResult<Vec<i32>> {
        let a1 = layout.get_long_array("amsua1Data", view)?;
        let a2 = layout.get_long_array("amsua2Data", view)?;
        let samples = self.descriptor().sample_count();
        let channels = self.descriptor().channel_count();
        let mut counts = vec![0i32; samples * channels];

        for i in 0..samples {
            let row = reverse_sample(samples, i) * channels;

            let offset = i * SENSOR_WORDS_A2 + 2;
            for j in 0..2 {
                counts[row + j] = (a2[offset + j] & 0xffff) as i32;
            }

            let offset = i * SENSOR_WORDS_A1 + 4;
            for j in 2..channels {
                counts[row + j] = (a1[offset + j - 2] & 0xffff) as i32;
            }
        }
        Ok(counts)
    }
}
