use crate::core::calibrate::TemperatureConstants;
use crate::core::instrument::Instrument;
use crate::io::fields::{Endian, FieldLayout, FieldView};
use crate::io::record::DataRecord;
use crate::io::sensors::{sensor_format, SensorFormat};
use crate::types::{Noaa1bError, Noaa1bResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

/// Bytes needed to identify the data type
pub const PROBE_SIZE: usize = 130;

/// Version 1 data type names, indexed by type code - 1
const V1_TYPES: [&str; 9] = ["LAC", "GAC", "HRPT", "TIP", "HIRS", "MSU", "SSU", "DCS", "SEM"];

/// Version 2+ data type names, indexed by type code - 1
const V2_TYPES: [&str; 13] = [
    "LAC", "GAC", "HRPT", "TIP", "HIRS", "MSU", "SSU", "DCS", "SEM", "AMSU-A", "AMSU-B", "MHS",
    "FRAC",
];

/// Spacecraft name for a version 2+ spacecraft id
pub fn spacecraft_name(id: u16) -> Option<&'static str> {
    match id {
        2 => Some("noaa-16"),
        4 => Some("noaa-15"),
        6 => Some("noaa-17"),
        7 => Some("noaa-18"),
        8 => Some("noaa-19"),
        11 => Some("metop-1"),
        12 => Some("metop-2"),
        _ => None,
    }
}

/// Identify the instrument from the start of a data header
pub fn probe_data_type(bytes: &[u8], endian: Endian) -> Noaa1bResult<Instrument> {
    // Version 1: spacecraft byte then type in the high nibble
    if bytes.len() >= 2 {
        let craft = bytes[0];
        let type_code = (bytes[1] >> 4) as usize;
        if (1..=8).contains(&craft) && (1..=9).contains(&type_code) {
            return Err(Noaa1bError::UnsupportedInstrument(format!(
                "NOAA 1b version 1 {} not implemented",
                V1_TYPES[type_code - 1]
            )));
        }
    }

    let layout = FieldLayout::load("data_header")?;
    let view = FieldView::new(bytes, endian);
    let craft = layout.get_long("spacecraftId", &view)? as u16;
    let type_code = layout.get_long("dataType", &view)? as usize;

    if spacecraft_name(craft).is_some() && (1..=13).contains(&type_code) {
        return match type_code {
            5 => Ok(Instrument::Hirs4),
            10 => Ok(Instrument::AmsuA),
            11 => Ok(Instrument::AmsuB),
            12 => Ok(Instrument::Mhs),
            _ => Err(Noaa1bError::UnsupportedInstrument(format!(
                "NOAA 1b version 2+ {} not implemented",
                V2_TYPES[type_code - 1]
            ))),
        };
    }

    Err(Noaa1bError::InvalidFormat(
        "Cannot determine data type".to_string(),
    ))
}

/// 1 January of `year` plus `day - 1` days plus `millis`
pub fn make_date(year: i64, day: i64, millis: i64) -> Noaa1bResult<DateTime<Utc>> {
    let start = Utc
        .with_ymd_and_hms(year as i32, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| Noaa1bError::InvalidFormat(format!("Invalid year {}", year)))?;
    Ok(start + Duration::days(day - 1) + Duration::milliseconds(millis))
}

/// Data header record, one per file
#[derive(Debug, Clone)]
pub struct DataHeader {
    format: &'static dyn SensorFormat,
    endian: Endian,
    spacecraft_id: u16,
    format_version: u32,
    header_count: usize,
    record_count: usize,
    dataset_name: String,
    creation_site: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    calibration: Vec<Option<TemperatureConstants>>,
    record_layout: Arc<FieldLayout>,
}

impl DataHeader {
    /// Identify and decode a data header
    pub fn decode(bytes: &[u8], endian: Endian) -> Noaa1bResult<Self> {
        let instrument = probe_data_type(bytes, endian)?;
        Self::decode_as(instrument, bytes, endian)
    }

    /// Decode a data header for a known instrument
    pub fn decode_as(instrument: Instrument, bytes: &[u8], endian: Endian) -> Noaa1bResult<Self> {
        let format = sensor_format(instrument);
        let layout = FieldLayout::load(format.header_layout())?;
        let record_layout = FieldLayout::load(format.record_layout())?;
        record_layout.require(&format.required_fields())?;

        let view = FieldView::new(bytes, endian);
        let long = |name: &str| layout.get_long(name, &view);

        let start_date = make_date(
            long("startYear")?,
            long("startDayOfYear")?,
            long("startTimeOfDay")?,
        )?;
        let end_date = make_date(
            long("endYear")?,
            long("endDayOfYear")?,
            long("endTimeOfDay")?,
        )?;

        let descriptor = format.descriptor();
        let mut calibration = Vec::with_capacity(descriptor.channel_count());
        for channel in 0..descriptor.channel_count() {
            let prefix = format.field_prefix(channel);
            let wavenumber = format!("{}CentralWavenumber", prefix);
            if !layout.contains(&wavenumber) {
                calibration.push(None);
                continue;
            }
            calibration.push(Some(TemperatureConstants::new(
                layout.get_float(&wavenumber, &view)?,
                layout.get_float(&format!("{}ConstantB", prefix), &view)?,
                layout.get_float(&format!("{}ConstantC", prefix), &view)?,
            )));
        }

        let header = Self {
            format,
            endian,
            spacecraft_id: long("spacecraftId")? as u16,
            format_version: long("formatVersion")? as u32,
            header_count: long("headerCount")? as usize,
            record_count: long("recordCount")? as usize,
            dataset_name: layout.get_string("datasetName", &view)?,
            creation_site: layout.get_string("creationSite", &view)?,
            start_date,
            end_date,
            calibration,
            record_layout: Arc::new(record_layout),
        };

        log::info!(
            "{} data header: {} records, {} to {}",
            instrument,
            header.record_count,
            header.start_date,
            header.end_date
        );
        Ok(header)
    }

    pub fn format(&self) -> &'static dyn SensorFormat {
        self.format
    }

    pub fn instrument(&self) -> Instrument {
        self.format.instrument()
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn spacecraft_id(&self) -> u16 {
        self.spacecraft_id
    }

    pub fn spacecraft(&self) -> &'static str {
        spacecraft_name(self.spacecraft_id).unwrap_or("unknown")
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Header records preceding the data, as stored
    pub fn header_count(&self) -> usize {
        self.header_count
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn record_size(&self) -> usize {
        self.format.record_size()
    }

    pub fn attribute_size(&self) -> usize {
        self.format.attribute_size()
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn creation_site(&self) -> &str {
        &self.creation_site
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Radiance to temperature constants for a 1-based channel
    pub fn temperature_constants(&self, channel: usize) -> Noaa1bResult<Option<TemperatureConstants>> {
        self.format.descriptor().check_channel(channel)?;
        Ok(self.calibration[channel - 1])
    }

    /// Constants as [wavenumber, b, c] triplets per channel, NaN where absent
    pub fn calibration(&self) -> Vec<f64> {
        self.calibration
            .iter()
            .flat_map(|c| match c {
                Some(k) => [k.wavenumber, k.b, k.c],
                None => [f64::NAN; 3],
            })
            .collect()
    }

    pub fn record_layout(&self) -> &FieldLayout {
        &self.record_layout
    }

    /// Wrap record bytes read from this file
    pub fn record<'a>(&'a self, bytes: &'a [u8]) -> DataRecord<'a> {
        DataRecord::new(self, bytes)
    }
}
