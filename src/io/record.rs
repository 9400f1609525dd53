use crate::core::calibrate::{ChannelCalibrator, CountCoefficients};
use crate::core::quality::RecordQuality;
use crate::io::fields::{FieldLayout, FieldView};
use crate::io::header::{make_date, DataHeader};
use crate::io::sensors::{reverse_sample, SensorFormat};
use crate::types::{CalibrationType, NavigationType, Noaa1bResult};
use chrono::{DateTime, Utc};

/// Values per navigation tuple
pub const NAVIGATION_VALUES: usize = 5;

const ANGLE_SCALE: f64 = 1e-2;
const LOCATION_SCALE: f64 = 1e-4;

/// Per-pixel navigation split by quantity, geographic order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationData {
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    pub sat_zenith: Vec<f64>,
    pub sun_zenith: Vec<f64>,
    pub rel_azimuth: Vec<f64>,
}

/// One scan line decoded on demand from a borrowed buffer.
///
/// The buffer may hold only the attribute prefix, in which case scan
/// line, date and the quality predicates are available and the
/// remaining accessors fail with an end-of-file error.
#[derive(Debug, Clone, Copy)]
pub struct DataRecord<'a> {
    header: &'a DataHeader,
    bytes: &'a [u8],
}

impl<'a> DataRecord<'a> {
    pub fn new(header: &'a DataHeader, bytes: &'a [u8]) -> Self {
        Self { header, bytes }
    }

    fn layout(&self) -> &'a FieldLayout {
        self.header.record_layout()
    }

    fn view(&self) -> FieldView<'a> {
        FieldView::new(self.bytes, self.header.endian())
    }

    fn format(&self) -> &'static dyn SensorFormat {
        self.header.format()
    }

    /// True if the buffer holds a complete record
    pub fn is_full(&self) -> bool {
        self.bytes.len() >= self.header.record_size()
    }

    /// 1-based scan line number
    pub fn scan_line(&self) -> Noaa1bResult<u32> {
        Ok(self.layout().get_long("scanLine", &self.view())? as u32)
    }

    pub fn date(&self) -> Noaa1bResult<DateTime<Utc>> {
        let view = self.view();
        let layout = self.layout();
        make_date(
            layout.get_long("scanYear", &view)?,
            layout.get_long("scanDayOfYear", &view)?,
            layout.get_long("scanTimeOfDay", &view)?,
        )
    }

    /// Raw quality fields
    pub fn quality(&self) -> Noaa1bResult<RecordQuality> {
        let view = self.view();
        let layout = self.layout();
        let scan_type = if layout.contains("scanType") {
            layout.get_bits("scanType", &view)?
        } else {
            0
        };
        Ok(RecordQuality::new(
            layout.get_long("qualityIndicator", &view)? as u32,
            layout.get_long("calibrationProblem", &view)? as u32,
            scan_type,
        ))
    }

    pub fn is_sensor_data_usable(&self) -> Noaa1bResult<bool> {
        Ok(self.quality()?.is_sensor_data_usable(&self.format().masks()))
    }

    pub fn is_calibration_usable(&self) -> Noaa1bResult<bool> {
        Ok(self.quality()?.is_calibration_usable(&self.format().masks()))
    }

    pub fn is_navigation_usable(&self) -> Noaa1bResult<bool> {
        Ok(self.quality()?.is_navigation_usable())
    }

    /// Counts as `samples x channels`, sample-major, geographic order
    pub fn sensor_data(&self) -> Noaa1bResult<Vec<i32>> {
        self.format().unpack_counts(self.layout(), &self.view())
    }

    /// Quadratic count coefficients per channel, NaN for channels whose
    /// calibration flags mark them bad
    pub fn calibration(&self) -> Noaa1bResult<Vec<CountCoefficients>> {
        let view = self.view();
        let layout = self.layout();
        let format = self.format();
        let masks = format.masks();
        let channels = format.descriptor().channel_count();

        let flags = match masks.channel {
            Some(_) => Some(layout.get_long_array("calibrationQualityFlags", &view)?),
            None => None,
        };

        let mut coefficients = Vec::with_capacity(channels);
        for channel in 0..channels {
            let good = flags
                .as_ref()
                .map(|f| masks.channel_usable(f[channel] as u32))
                .unwrap_or(true);
            if !good {
                coefficients.push(CountCoefficients::invalid());
                continue;
            }
            let prefix = format.field_prefix(channel);
            coefficients.push(CountCoefficients::new(
                layout.get_float(&format!("{}ZerothOrder", prefix), &view)?,
                layout.get_float(&format!("{}FirstOrder", prefix), &view)?,
                layout.get_float(&format!("{}SecondOrder", prefix), &view)?,
            ));
        }
        Ok(coefficients)
    }

    /// Navigation tuples of [solar zenith, satellite zenith, relative
    /// azimuth, latitude, longitude] per sample, geographic order
    pub fn navigation(&self) -> Noaa1bResult<Vec<f64>> {
        let view = self.view();
        let layout = self.layout();
        let angles = layout.get_short_array("angles", &view)?;
        let locations = layout.get_int_array("earthLocations", &view)?;
        let samples = self.format().descriptor().sample_count();

        let mut navigation = vec![0.0; NAVIGATION_VALUES * samples];
        for i in 0..samples {
            let base = NAVIGATION_VALUES * reverse_sample(samples, i);
            for j in 0..3 {
                navigation[base + j] = angles[3 * i + j] as f64 * ANGLE_SCALE;
            }
            for j in 0..2 {
                navigation[base + 3 + j] = locations[2 * i + j] as f64 * LOCATION_SCALE;
            }
        }
        Ok(navigation)
    }

    /// Counts for one 1-based channel
    pub fn count_data(&self, channel: usize) -> Noaa1bResult<Vec<i32>> {
        let descriptor = self.format().descriptor();
        descriptor.check_channel(channel)?;
        let channels = descriptor.channel_count();
        Ok(self
            .sensor_data()?
            .chunks(channels)
            .map(|sample| sample[channel - 1])
            .collect())
    }

    /// Calibrated values for one 1-based channel
    pub fn calibrated_data(
        &self,
        channel: usize,
        calibration_type: CalibrationType,
    ) -> Noaa1bResult<Vec<f64>> {
        let calibrator = self.calibrator(channel, calibration_type)?;
        Ok(calibrator.calibrate_counts(&self.count_data(channel)?))
    }

    /// Calibrator for one 1-based channel of this scan line
    pub fn calibrator(
        &self,
        channel: usize,
        calibration_type: CalibrationType,
    ) -> Noaa1bResult<ChannelCalibrator> {
        let thermal = self.format().descriptor().is_thermal(channel)?;
        let coefficients = self.calibration()?[channel - 1];
        ChannelCalibrator::new(
            channel,
            thermal,
            coefficients,
            self.header.temperature_constants(channel)?,
            calibration_type,
        )
    }

    /// One navigation quantity per sample
    pub fn navigation_data(&self, quantity: NavigationType) -> Noaa1bResult<Vec<f64>> {
        let index = quantity.tuple_index();
        Ok(self
            .navigation()?
            .chunks(NAVIGATION_VALUES)
            .map(|tuple| tuple[index])
            .collect())
    }

    pub fn location_data(&self) -> Noaa1bResult<LocationData> {
        let navigation = self.navigation()?;
        let mut data = LocationData::default();
        for tuple in navigation.chunks(NAVIGATION_VALUES) {
            data.sun_zenith.push(tuple[0]);
            data.sat_zenith.push(tuple[1]);
            data.rel_azimuth.push(tuple[2]);
            data.latitude.push(tuple[3]);
            data.longitude.push(tuple[4]);
        }
        Ok(data)
    }
}
