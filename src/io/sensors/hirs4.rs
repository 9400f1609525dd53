use super::{reverse_sample, SensorFormat};
use crate::core::instrument::Instrument;
use crate::io::fields::{FieldLayout, FieldView};
use crate::types::Noaa1bResult;

/// Position of each channel's word within a sample block
const POSITION: [usize; 20] = [
    0, 2, 3, 5, 15, 14, 9, 10, 19, 12, 7, 17, 4, 13, 16, 18, 1, 6, 8, 11,
];

/// Words per sample: 20 channels plus 4 housekeeping words
const SENSOR_WORDS: usize = 24;

/// Raw HIRS/4 counts are offset by this value
const COUNT_OFFSET: i32 = 4096;

/// HIRS/4 record format
#[derive(Debug, Clone, Copy)]
pub struct Hirs4;

impl SensorFormat for Hirs4 {
    fn instrument(&self) -> Instrument {
        Instrument::Hirs4
    }

    fn header_layout(&self) -> &'static str {
        "hirs4_header"
    }

    fn record_layout(&self) -> &'static str {
        "hirs4_record"
    }

    fn record_size(&self) -> usize {
        4608
    }

    fn field_prefix(&self, channel: usize) -> String {
        format!("ch{}", channel + 1)
    }

    fn sensor_fields(&self) -> &'static [&'static str] {
        &["hirsData"]
    }

    fn unpack_counts(&self, layout: &FieldLayout, view: &FieldView) -> Noaa1bResult<Vec<i32>> {
        let words = layout.get_short_array("hirsData", view)?;
        let samples = self.descriptor().sample_count();
        let channels = self.descriptor().channel_count();
        let mut counts = vec![0i32; samples * channels];

        for i in 0..samples {
            let base = i * SENSOR_WORDS + 2;
            let row = reverse_sample(samples, i) * channels;
            for (j, &position) in POSITION.iter().enumerate() {
                counts[row + j] = words[base + position] as i32 - COUNT_OFFSET;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fields::Endian;
    use byteorder::{BigEndian, ByteOrder};

    #[test]
    fn test_channel_permutation_and_offset() {
        let layout = FieldLayout::load("hirs4_record").unwrap();
        let offset = layout.field("hirsData").unwrap().offset;
        let mut buf = vec![0u8; 4608];
        // Physical sample 0, channel 9 sits at word 2 + 19
        BigEndian::write_i16(&mut buf[offset + 2 * 21..], 5000);
        // Physical sample 55, channel 1 sits at word 2 + 0
        BigEndian::write_i16(&mut buf[offset + 2 * (55 * 24 + 2)..], 4000);

        let counts = Hirs4
            .unpack_counts(&layout, &FieldView::new(&buf, Endian::Big))
            .unwrap();
        assert_eq!(counts[55 * 20 + 8], 904);
        assert_eq!(counts[0], -96);
        // Untouched words decode to the negative offset
        assert_eq!(counts[1], -COUNT_OFFSET);
    }
}
