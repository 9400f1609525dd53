//! Synthetic big-endian AMSU-A files for integration tests.

#![allow(dead_code)]

use byteorder::{BigEndian, ByteOrder};
use std::io::Write;
use tempfile::NamedTempFile;

pub const RECORD_SIZE: usize = 2560;
pub const SAMPLES: usize = 30;
pub const CHANNELS: usize = 15;

/// 2008-01-01T00:00:00Z
pub const START_MILLIS: i64 = 1_199_145_600_000;

/// Header constants for every channel: 1.7 cm^-1, b = 0, c = 1
pub const WAVENUMBER: f64 = 1.7;
const WAVENUMBER_RAW: i32 = 1_700_000;
const CONSTANT_C_RAW: i32 = 1_000_000;

/// First order coefficient for every channel: 6e-7 per count
pub const FIRST_ORDER: f64 = 6e-7;
const FIRST_ORDER_RAW: i32 = 6_000_000;

pub const EARTH_LOCATION_UNAVAILABLE: u32 = 0x0800_0000;
pub const DO_NOT_USE: u32 = 0x8000_0000;

const ANGLES: usize = 328;
const LOCATIONS: usize = 508;
const AMSUA1: usize = 748;
const AMSUA2: usize = 1768;

/// One synthetic scan record
#[derive(Debug, Clone, Copy)]
pub struct SyntheticRecord {
    pub scan_line: u16,
    pub quality: u32,
    /// Count for every channel and sample
    pub count: u16,
}

impl SyntheticRecord {
    pub fn good(scan_line: u16) -> Self {
        Self {
            scan_line,
            quality: 0,
            count: 10_000,
        }
    }

    pub fn unnavigable(scan_line: u16) -> Self {
        Self {
            quality: EARTH_LOCATION_UNAVAILABLE,
            ..Self::good(scan_line)
        }
    }
}

/// Latitude written for a sample in record order
pub fn latitude(record: usize, sample: usize) -> f64 {
    10.0 + record as f64 + sample as f64 * 0.5
}

/// Longitude written for a sample in record order
pub fn longitude(record: usize, sample: usize) -> f64 {
    -120.0 + sample as f64 + record as f64 * 0.25
}

/// Satellite zenith angle written for a sample in record order
pub fn sat_zenith(sample: usize) -> f64 {
    sample as f64 * 1.5
}

/// Expected Celsius brightness temperature for a count, with the
/// coefficient and wavenumber held in single precision as decoded
pub fn expected_celsius(count: u16) -> f64 {
    let radiance = (FIRST_ORDER as f32 as f64) * count as f64;
    let v = WAVENUMBER as f32 as f64;
    let kelvin = 1.438_775_2 * v / (1.0 + 1.191_042_7e-5 * v * v * v / radiance).ln();
    kelvin - 273.15
}

fn header(record_count: usize) -> Vec<u8> {
    let mut buf = vec![0u8; RECORD_SIZE];
    buf[0..3].copy_from_slice(b"NSS");
    BigEndian::write_u16(&mut buf[4..], 2);
    BigEndian::write_u16(&mut buf[14..], 1);
    let name = b"NSS.AMAX.NN.D08001.S0000.E0100.B1234567.GC";
    buf[22..22 + name.len()].copy_from_slice(name);
    BigEndian::write_u16(&mut buf[72..], 7);
    BigEndian::write_u16(&mut buf[76..], 10);
    BigEndian::write_u16(&mut buf[84..], 2008);
    BigEndian::write_u16(&mut buf[86..], 1);
    BigEndian::write_u16(&mut buf[96..], 2008);
    BigEndian::write_u16(&mut buf[98..], 1);
    BigEndian::write_u32(&mut buf[100..], 3_600_000);
    BigEndian::write_u16(&mut buf[128..], record_count as u16);

    for channel in 0..CHANNELS {
        let base = 200 + channel * 12;
        BigEndian::write_i32(&mut buf[base..], WAVENUMBER_RAW);
        BigEndian::write_i32(&mut buf[base + 4..], 0);
        BigEndian::write_i32(&mut buf[base + 8..], CONSTANT_C_RAW);
    }
    buf
}

fn record(index: usize, rec: &SyntheticRecord) -> Vec<u8> {
    let mut buf = vec![0u8; RECORD_SIZE];
    BigEndian::write_u16(&mut buf[0..], rec.scan_line);
    BigEndian::write_u16(&mut buf[2..], 2008);
    BigEndian::write_u16(&mut buf[4..], 1);
    BigEndian::write_u32(&mut buf[8..], index as u32 * 8_000);
    BigEndian::write_u32(&mut buf[24..], rec.quality);

    for channel in 0..CHANNELS {
        BigEndian::write_i32(&mut buf[72 + channel * 12 + 4..], FIRST_ORDER_RAW);
    }

    for sample in 0..SAMPLES {
        let angles = ANGLES + sample * 6;
        BigEndian::write_i16(&mut buf[angles..], 4500);
        BigEndian::write_i16(&mut buf[angles + 2..], (sat_zenith(sample) * 100.0) as i16);
        BigEndian::write_i16(&mut buf[angles + 4..], -9000);

        let locations = LOCATIONS + sample * 8;
        BigEndian::write_i32(
            &mut buf[locations..],
            (latitude(index, sample) * 1e4).round() as i32,
        );
        BigEndian::write_i32(
            &mut buf[locations + 4..],
            (longitude(index, sample) * 1e4).round() as i32,
        );

        for channel in 0..2 {
            let word = AMSUA2 + (sample * 4 + 2 + channel) * 2;
            BigEndian::write_u16(&mut buf[word..], rec.count);
        }
        for channel in 2..CHANNELS {
            let word = AMSUA1 + (sample * 17 + 4 + channel - 2) * 2;
            BigEndian::write_u16(&mut buf[word..], rec.count);
        }
    }
    buf
}

/// Header record followed by one record per entry
pub fn amsua_bytes(records: &[SyntheticRecord]) -> Vec<u8> {
    let mut bytes = header(records.len());
    for (index, rec) in records.iter().enumerate() {
        bytes.extend(record(index, rec));
    }
    bytes
}

/// A 122 byte TBM archive header
pub fn tbm_header() -> Vec<u8> {
    let mut buf = vec![b' '; 122];
    buf[0..6].copy_from_slice(b"TBM001");
    let name = b"NSS.AMAX.NN.D08001.S0000.E0100.B1234567.GC";
    buf[30..30 + name.len()].copy_from_slice(name);
    buf[89..96].copy_from_slice(b"0000060");
    for b in &mut buf[97..117] {
        *b = b'Y';
    }
    buf[117..119].copy_from_slice(b"16");
    buf
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
