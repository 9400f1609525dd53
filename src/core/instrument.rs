use crate::types::{Noaa1bError, Noaa1bResult};
use serde::{Deserialize, Serialize};

/// Radiometer instruments decoded by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    AmsuA,
    AmsuB,
    Mhs,
    Hirs4,
}

/// Static per-sensor constants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentDescriptor {
    pub name: &'static str,
    pub long_name: &'static str,
    channel_names: &'static [&'static str],
    thermal: &'static [bool],
    sample_count: usize,
}

const AMSUA_CHANNELS: [&str; 15] = [
    "ch1", "ch2", "ch3", "ch4", "ch5", "ch6", "ch7", "ch8", "ch9", "ch10", "ch11", "ch12",
    "ch13", "ch14", "ch15",
];

const AMSUB_CHANNELS: [&str; 5] = ["ch16", "ch17", "ch18", "ch19", "ch20"];

const MHS_CHANNELS: [&str; 5] = ["chH1", "chH2", "chH3", "chH4", "chH5"];

const HIRS4_CHANNELS: [&str; 20] = [
    "ch1", "ch2", "ch3", "ch4", "ch5", "ch6", "ch7", "ch8", "ch9", "ch10", "ch11", "ch12",
    "ch13", "ch14", "ch15", "ch16", "ch17", "ch18", "ch19", "ch20",
];

const ALL_THERMAL_15: [bool; 15] = [true; 15];
const ALL_THERMAL_5: [bool; 5] = [true; 5];

// HIRS/4 channel 20 is the visible channel
const HIRS4_THERMAL: [bool; 20] = [
    true, true, true, true, true, true, true, true, true, true, true, true, true, true, true,
    true, true, true, true, false,
];

static AMSUA: InstrumentDescriptor = InstrumentDescriptor {
    name: "AMSU-A",
    long_name: "Advanced Microwave Sounding Unit-A",
    channel_names: &AMSUA_CHANNELS,
    thermal: &ALL_THERMAL_15,
    sample_count: 30,
};

static AMSUB: InstrumentDescriptor = InstrumentDescriptor {
    name: "AMSU-B",
    long_name: "Advanced Microwave Sounding Unit-B",
    channel_names: &AMSUB_CHANNELS,
    thermal: &ALL_THERMAL_5,
    sample_count: 90,
};

static MHS: InstrumentDescriptor = InstrumentDescriptor {
    name: "MHS",
    long_name: "Microwave Humidity Sounder",
    channel_names: &MHS_CHANNELS,
    thermal: &ALL_THERMAL_5,
    sample_count: 90,
};

static HIRS4: InstrumentDescriptor = InstrumentDescriptor {
    name: "HIRS/4",
    long_name: "High Resolution Infrared Radiation Sounder/4",
    channel_names: &HIRS4_CHANNELS,
    thermal: &HIRS4_THERMAL,
    sample_count: 56,
};

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::AmsuA,
        Instrument::AmsuB,
        Instrument::Mhs,
        Instrument::Hirs4,
    ];

    pub fn descriptor(&self) -> &'static InstrumentDescriptor {
        match self {
            Instrument::AmsuA => &AMSUA,
            Instrument::AmsuB => &AMSUB,
            Instrument::Mhs => &MHS,
            Instrument::Hirs4 => &HIRS4,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl InstrumentDescriptor {
    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Name of a channel given its 1-based index
    pub fn channel_name(&self, channel: usize) -> Noaa1bResult<&'static str> {
        self.check_channel(channel)?;
        Ok(self.channel_names[channel - 1])
    }

    /// True if the 1-based channel is calibrated to radiance/temperature
    pub fn is_thermal(&self, channel: usize) -> Noaa1bResult<bool> {
        self.check_channel(channel)?;
        Ok(self.thermal[channel - 1])
    }

    /// 1-based channel index for a channel name
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_names
            .iter()
            .position(|&n| n == name)
            .map(|i| i + 1)
    }

    pub fn channel_names(&self) -> &'static [&'static str] {
        self.channel_names
    }

    /// Validate a 1-based channel index
    pub fn check_channel(&self, channel: usize) -> Noaa1bResult<()> {
        if channel == 0 || channel > self.channel_count() {
            return Err(Noaa1bError::InvalidArgument(format!(
                "Channel {} out of range [1, {}] for {}",
                channel,
                self.channel_count(),
                self.name
            )));
        }
        Ok(())
    }
}
