//! Scan-line and channel quality predicates
//!
//! Quality indicator bits (MSB = bit 31):
//! - bit 31: do not use scan for product generation
//! - bit 30: time sequence error
//! - bit 28: insufficient data for calibration / calibration anomaly
//! - bit 27: earth location data not available
//! - bit 25: instrument status changed with this scan
//! - bits 4-0: sync, minor frame, major frame and parity errors (microwave)

use super::instrument::Instrument;

/// Quality indicator bit for insufficient calibration data
pub const CALIBRATION_INSUFFICIENT: u32 = 0x1000_0000;

/// Quality indicator bit for missing earth location data
pub const EARTH_LOCATION_UNAVAILABLE: u32 = 0x0800_0000;

/// Scan type value for an earth view scan (HIRS/4)
pub const EARTH_VIEW_SCAN: u32 = 0;

/// Fatal bit masks for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityMasks {
    /// Bits of the quality indicator that make sensor data unusable
    pub sensor: u32,
    /// Bits of the calibration problem field that make calibration unusable
    pub calibration_problem: u32,
    /// Bits of a per-channel calibration flag word that void the channel
    pub channel: Option<u32>,
    /// Sensor data also requires an earth view scan type
    pub require_earth_view: bool,
}

impl QualityMasks {
    pub const AMSUA: QualityMasks = QualityMasks {
        sensor: 0xC200_000F,
        calibration_problem: 0xA4,
        channel: Some(0x1B8),
        require_earth_view: false,
    };

    pub const AMSUB: QualityMasks = QualityMasks {
        sensor: 0xC200_001F,
        calibration_problem: 0xA4,
        channel: Some(0x38),
        require_earth_view: false,
    };

    pub const MHS: QualityMasks = QualityMasks {
        sensor: 0xC200_001F,
        calibration_problem: 0xA4,
        channel: Some(0x78),
        require_earth_view: false,
    };

    // HIRS/4 has no per-channel flags, coefficients are always read
    pub const HIRS4: QualityMasks = QualityMasks {
        sensor: 0xC200_0000,
        calibration_problem: 0xAE,
        channel: None,
        require_earth_view: true,
    };

    pub fn for_instrument(instrument: Instrument) -> Self {
        match instrument {
            Instrument::AmsuA => Self::AMSUA,
            Instrument::AmsuB => Self::AMSUB,
            Instrument::Mhs => Self::MHS,
            Instrument::Hirs4 => Self::HIRS4,
        }
    }

    /// True if a per-channel calibration flag word has no fatal bits
    pub fn channel_usable(&self, flags: u32) -> bool {
        match self.channel {
            Some(mask) => flags & mask == 0,
            None => true,
        }
    }
}

/// Raw quality fields extracted from a record's attribute prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordQuality {
    pub quality_indicator: u32,
    pub calibration_problem: u32,
    pub scan_type: u32,
}

impl RecordQuality {
    pub fn new(quality_indicator: u32, calibration_problem: u32, scan_type: u32) -> Self {
        Self {
            quality_indicator,
            calibration_problem,
            scan_type,
        }
    }

    pub fn is_sensor_data_usable(&self, masks: &QualityMasks) -> bool {
        let earth_view = !masks.require_earth_view || self.scan_type == EARTH_VIEW_SCAN;
        earth_view && self.quality_indicator & masks.sensor == 0
    }

    /// Usable if the insufficient-calibration bit is clear OR the
    /// calibration problem field is clean.
    pub fn is_calibration_usable(&self, masks: &QualityMasks) -> bool {
        self.quality_indicator & CALIBRATION_INSUFFICIENT == 0
            || self.calibration_problem & masks.calibration_problem == 0
    }

    pub fn is_navigation_usable(&self) -> bool {
        self.quality_indicator & EARTH_LOCATION_UNAVAILABLE == 0
    }
}
