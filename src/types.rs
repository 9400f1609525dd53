use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scan time in milliseconds since the Unix epoch
pub type EpochMillis = i64;

/// Missing value for 16-bit scaled grids (channels and angles)
pub const MISSING_SHORT: i16 = -32768;

/// Missing value for floating point grids (latitude, longitude)
pub const MISSING_FLOAT: f32 = f32::NAN;

/// Missing value for scan time grids
pub const MISSING_TIME: EpochMillis = -1;

/// Scale factor applied to values stored in 16-bit grids
pub const SHORT_SCALE: f64 = 0.01;

/// Physical quantity produced by calibrating raw counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationType {
    /// Radiance in mW/(m^2 sr cm^-1)
    Radiance,
    /// Brightness temperature in kelvin
    Kelvin,
    /// Brightness temperature in degrees Celsius
    Celsius,
    /// Reflectance as a fraction
    Reflectance,
    /// Albedo in percent
    Albedo,
}

impl CalibrationType {
    /// Units string attached to calibrated grids
    pub fn units(&self) -> &'static str {
        match self {
            CalibrationType::Radiance => "mW/(m^2 sr cm^-1)",
            CalibrationType::Kelvin => "kelvin",
            CalibrationType::Celsius => "celsius",
            CalibrationType::Reflectance => "1",
            CalibrationType::Albedo => "percent",
        }
    }

    /// True for the calibration types valid on thermal channels
    pub fn is_thermal(&self) -> bool {
        matches!(
            self,
            CalibrationType::Radiance | CalibrationType::Kelvin | CalibrationType::Celsius
        )
    }
}

impl std::fmt::Display for CalibrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationType::Radiance => write!(f, "RADIANCE"),
            CalibrationType::Kelvin => write!(f, "KELVIN"),
            CalibrationType::Celsius => write!(f, "CELSIUS"),
            CalibrationType::Reflectance => write!(f, "REFLECTANCE"),
            CalibrationType::Albedo => write!(f, "ALBEDO"),
        }
    }
}

/// Navigation quantity carried per pixel in each data record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationType {
    Latitude,
    Longitude,
    SatZenith,
    SunZenith,
    RelAzimuth,
}

impl NavigationType {
    /// All navigation variables in the order they are exposed by readers
    pub const ALL: [NavigationType; 5] = [
        NavigationType::Latitude,
        NavigationType::Longitude,
        NavigationType::SatZenith,
        NavigationType::SunZenith,
        NavigationType::RelAzimuth,
    ];

    /// Variable name used by readers
    pub fn variable_name(&self) -> &'static str {
        match self {
            NavigationType::Latitude => "latitude",
            NavigationType::Longitude => "longitude",
            NavigationType::SatZenith => "sat_zenith",
            NavigationType::SunZenith => "sun_zenith",
            NavigationType::RelAzimuth => "rel_azimuth",
        }
    }

    /// Index of this quantity within a navigation tuple of
    /// [solar zenith, satellite zenith, relative azimuth, latitude, longitude]
    pub fn tuple_index(&self) -> usize {
        match self {
            NavigationType::SunZenith => 0,
            NavigationType::SatZenith => 1,
            NavigationType::RelAzimuth => 2,
            NavigationType::Latitude => 3,
            NavigationType::Longitude => 4,
        }
    }

    /// Latitude and longitude are stored as floats, angles as scaled shorts
    pub fn is_location(&self) -> bool {
        matches!(self, NavigationType::Latitude | NavigationType::Longitude)
    }
}

/// Name of the per-line scan time variable
pub const SCAN_TIME_VARIABLE: &str = "scan_time";

/// Category of a grid variable exposed by a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    /// Calibrated channel data, 1-based channel number
    Channel { channel: usize, calibration: CalibrationType },
    /// Per-pixel navigation data
    Navigation(NavigationType),
    /// Per-line scan time replicated across columns
    ScanTime,
}

impl VariableKind {
    /// Units string for this variable
    pub fn units(&self) -> &'static str {
        match self {
            VariableKind::Channel { calibration, .. } => calibration.units(),
            VariableKind::Navigation(_) => "degrees",
            VariableKind::ScanTime => "milliseconds",
        }
    }
}

/// Archive header summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub kind: String,
    pub header_size: usize,
    pub dataset_name: String,
    pub sensor_word_size: Option<u32>,
    pub channel_selection: Vec<bool>,
}

/// File-level metadata exposed to the surrounding application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub spacecraft: String,
    pub instrument: String,
    pub data_format: String,
    pub format_version: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub record_count: usize,
    pub header_count: usize,
    pub record_size: usize,
    pub dataset_name: String,
    pub creation_site: String,
    pub rows: usize,
    pub columns: usize,
    pub archive: Option<ArchiveInfo>,
}

/// Error types for NOAA 1b decoding
#[derive(Debug, thiserror::Error)]
pub enum Noaa1bError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported instrument: {0}")]
    UnsupportedInstrument(String),

    #[error("Missing field layout resource for {0}")]
    MissingLayout(String),

    #[error("Missing field '{field}' in layout {layout}")]
    MissingField { layout: String, field: String },

    #[error("Field layout error: {0}")]
    Layout(String),

    #[error("No valid scan lines found")]
    NoUsableLines,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot write tile to read-only dataset")]
    ReadOnly,

    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Noaa1bError {
    /// True for errors that callers should treat as I/O failures
    pub fn is_io(&self) -> bool {
        matches!(self, Noaa1bError::Io(_) | Noaa1bError::ReadOnly)
    }
}

/// Result type for NOAA 1b operations
pub type Noaa1bResult<T> = Result<T, Noaa1bError>;
