mod common;

use approx::assert_relative_eq;
use common::*;
use flate2::write::GzEncoder;
use flate2::Compression;
use noaa1b::io::grid::RecordSource;
use noaa1b::io::{Noaa1bFile, Noaa1bReader, SwathGrid, TileData};
use noaa1b::types::{MISSING_SHORT, MISSING_TIME};
use noaa1b::{CalibrationType, Instrument, LineMap, Noaa1bError, ReaderConfig, VariableKind};
use std::io::Write;
use std::sync::Arc;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Five physical records where records 2 and 4 have no usable navigation
/// and repeat the scan line of the record before them.
fn five_records() -> Vec<SyntheticRecord> {
    vec![
        SyntheticRecord::good(1),
        SyntheticRecord::unnavigable(1),
        SyntheticRecord::good(2),
        SyntheticRecord::unnavigable(2),
        SyntheticRecord::good(3),
    ]
}

#[test]
fn test_amsua_channel_grid_skips_unnavigable_records() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();

    assert_eq!(reader.instrument(), Instrument::AmsuA);
    assert_eq!(reader.line_map().rows(), &[Some(0), Some(2), Some(4)]);

    let metadata = reader.metadata();
    println!("Metadata: {:?}", metadata);
    assert_eq!(metadata.spacecraft, "noaa-18");
    assert_eq!(metadata.record_count, 5);
    assert_eq!((metadata.rows, metadata.columns), (3, 30));
    assert_eq!(metadata.data_format, "NOAA 1b version 2 AMSU-A");
    assert!(metadata.archive.is_none());

    let mut grid = reader.variable("ch1").unwrap();
    assert_eq!(grid.units(), "celsius");
    assert_eq!(grid.dimensions(), (3, 30));

    let expected = expected_celsius(10_000);
    match grid.read_all().unwrap() {
        TileData::Short(values) => {
            assert_eq!(values.dim(), (3, 30));
            for &v in values.iter() {
                assert_ne!(v, MISSING_SHORT);
                assert_relative_eq!(v as f64 * 0.01, expected, epsilon = 0.006);
            }
        }
        other => panic!("unexpected tile type {:?}", other),
    }
}

#[test]
fn test_amsua_location_grids_are_reflected() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();

    let mut lat = reader.variable("latitude").unwrap();
    let mut lon = reader.variable("longitude").unwrap();
    assert_eq!(lat.units(), "degrees");

    let (TileData::Float(lat), TileData::Float(lon)) = (lat.read_all().unwrap(), lon.read_all().unwrap()) else {
        panic!("location grids must be float");
    };
    assert_eq!(lat.dim(), (3, 30));
    assert_eq!(lon.dim(), (3, 30));
    assert!(lat.iter().all(|v| !v.is_nan()));

    // Logical rows 0, 1, 2 come from physical records 0, 2, 4
    for (row, record) in [0usize, 2, 4].into_iter().enumerate() {
        for col in 0..SAMPLES {
            let sample = SAMPLES - 1 - col;
            assert_relative_eq!(lat[[row, col]] as f64, latitude(record, sample), epsilon = 1e-4);
            assert_relative_eq!(lon[[row, col]] as f64, longitude(record, sample), epsilon = 1e-4);
        }
    }

    let mut zenith = reader.variable("sat_zenith").unwrap();
    assert_eq!(zenith.scale(), 0.01);
    assert_relative_eq!(zenith.value(1, 0).unwrap().unwrap(), sat_zenith(29), epsilon = 1e-9);
}

#[test]
fn test_scan_time_grid() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();

    let mut times = reader.variable("scan_time").unwrap();
    assert_eq!(times.units(), "milliseconds");
    let TileData::Long(times) = times.read_all().unwrap() else {
        panic!("scan time grid must be long");
    };
    assert_eq!(times[[0, 0]], START_MILLIS);
    assert_eq!(times[[1, 29]], START_MILLIS + 16_000);
    assert_eq!(times[[2, 5]], START_MILLIS + 32_000);
}

#[test]
fn test_disjoint_lines_keep_latest_single_line() {
    init();
    // Lines 1, 3, 5 navigable, lines 2 and 4 not: three runs of length one
    let records: Vec<_> = (1..=5)
        .map(|line| {
            if line % 2 == 0 {
                SyntheticRecord::unnavigable(line)
            } else {
                SyntheticRecord::good(line)
            }
        })
        .collect();
    let file = write_temp(&amsua_bytes(&records));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();

    assert_eq!(reader.line_map().rows(), &[Some(4)]);
    assert_eq!(reader.line_map().first_scan_line(), 5);
}

#[test]
fn test_unusable_sensor_row_is_missing() {
    init();
    let mut records: Vec<_> = (1..=4).map(SyntheticRecord::good).collect();
    records[2].quality = DO_NOT_USE;
    let file = write_temp(&amsua_bytes(&records));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default().with_tile_rows(2)).unwrap();

    let mut grid = reader.variable("ch3").unwrap();
    assert_eq!(grid.tiling().tile_count(), 2);
    let TileData::Short(values) = grid.read_all().unwrap() else {
        panic!("channel grid must be short");
    };
    assert!(values.row(2).iter().all(|&v| v == MISSING_SHORT));
    assert!(values.row(3).iter().all(|&v| v != MISSING_SHORT));

    // Navigation does not depend on the sensor quality bits
    let mut lat = reader.variable("latitude").unwrap();
    assert!(lat.value(2, 0).unwrap().is_some());

    assert!(reader.calibrated_row(3, 2, CalibrationType::Kelvin).unwrap().is_none());
    let kelvin = reader.calibrated_row(3, 3, CalibrationType::Kelvin).unwrap().unwrap();
    assert_relative_eq!(kelvin[0], expected_celsius(10_000) + 273.15, epsilon = 1e-9);
}

#[test]
fn test_gap_rows_are_filled_with_missing_values() {
    init();
    let records: Vec<_> = (1..=3).map(SyntheticRecord::good).collect();
    let bytes = amsua_bytes(&records);
    let file = Noaa1bFile::from_source("memory", Box::new(std::io::Cursor::new(bytes)), false).unwrap();
    let source = RecordSource::shared(file);
    let line_map = Arc::new(LineMap::from_rows(vec![Some(0), None, Some(2)]));
    let config = ReaderConfig::default();

    let grid = |kind: VariableKind, name: &str| {
        SwathGrid::new(name, kind, Arc::clone(&source), Arc::clone(&line_map), SAMPLES, &config)
    };

    let channel = VariableKind::Channel {
        channel: 1,
        calibration: CalibrationType::Celsius,
    };
    let TileData::Short(values) = grid(channel, "ch1").read_all().unwrap() else {
        panic!("channel grid must be short");
    };
    assert!(values.row(1).iter().all(|&v| v == MISSING_SHORT));
    assert!(values.row(0).iter().all(|&v| v != MISSING_SHORT));

    let nav = VariableKind::Navigation(noaa1b::NavigationType::Latitude);
    let TileData::Float(values) = grid(nav, "latitude").read_all().unwrap() else {
        panic!("latitude grid must be float");
    };
    assert!(values.row(1).iter().all(|v| v.is_nan()));
    assert!(values.row(2).iter().all(|v| !v.is_nan()));

    let nav = VariableKind::Navigation(noaa1b::NavigationType::SunZenith);
    let TileData::Short(values) = grid(nav, "sun_zenith").read_all().unwrap() else {
        panic!("angle grid must be short");
    };
    assert!(values.row(1).iter().all(|&v| v == MISSING_SHORT));
    assert!(values.row(0).iter().all(|&v| v == 4500));

    let TileData::Long(values) = grid(VariableKind::ScanTime, "scan_time").read_all().unwrap() else {
        panic!("scan time grid must be long");
    };
    assert!(values.row(1).iter().all(|&v| v == MISSING_TIME));
    assert_eq!(values[[2, 0]], START_MILLIS + 16_000);
}

#[test]
fn test_grid_is_read_only() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();
    let mut grid = reader.variable("ch2").unwrap();
    let tile = grid.read_tile(0).unwrap();

    let err = grid.write_tile(&tile).unwrap_err();
    assert!(matches!(err, Noaa1bError::ReadOnly));
    assert!(err.is_io());
}

#[test]
fn test_tile_cache_reuses_decoded_rows() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();
    let mut grid = reader.variable("ch5").unwrap();

    grid.read_all().unwrap();
    grid.value(0, 0).unwrap();
    let stats = grid.cache_stats();
    println!("Cache stats: {:?}", stats);
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 3);
}

#[test]
fn test_second_grid_handle_shares_decoded_tiles() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();

    let mut first = reader.variable("ch5").unwrap();
    first.read_all().unwrap();
    drop(first);

    let mut second = reader.variable("ch5").unwrap();
    assert!(second.value(0, 0).unwrap().is_some());
    let stats = second.cache_stats();
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 1);

    // Other variables keep their own cache
    let other = reader.variable("ch6").unwrap();
    assert_eq!(other.cache_stats().entries, 0);

    // Closing drops decoded tiles even while handles are alive
    reader.close().unwrap();
    assert_eq!(second.cache_stats().entries, 0);
    assert_eq!(second.cache_stats().memory_bytes, 0);
}

#[test]
fn test_unknown_variable_and_bad_index() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();

    assert!(matches!(reader.variable("ch16"), Err(Noaa1bError::InvalidArgument(_))));
    assert!(matches!(
        reader.calibrated_row(16, 0, CalibrationType::Radiance),
        Err(Noaa1bError::InvalidArgument(_))
    ));
    assert!(matches!(
        reader.calibrated_row(1, 3, CalibrationType::Radiance),
        Err(Noaa1bError::OutOfBounds(_))
    ));
    // Visible calibration on a thermal channel
    assert!(matches!(
        reader.calibrated_row(1, 0, CalibrationType::Albedo),
        Err(Noaa1bError::InvalidArgument(_))
    ));
}

#[test]
fn test_gzip_file_with_archive_header() {
    init();
    let mut bytes = tbm_header();
    bytes.extend(amsua_bytes(&five_records()));

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes).unwrap();
    let file = write_temp(&encoder.finish().unwrap());

    let reader = Noaa1bReader::open(file.path(), ReaderConfig::default()).unwrap();
    let archive = reader.metadata().archive.as_ref().expect("archive header");
    println!("Archive: {:?}", archive);
    assert_eq!(reader.metadata().rows, 3);

    let mut grid = reader.variable("ch15").unwrap();
    assert!(grid.value(2, 29).unwrap().is_some());
    reader.close().unwrap();
}

#[test]
fn test_no_navigable_lines_is_fatal() {
    init();
    let records: Vec<_> = (1..=3).map(SyntheticRecord::unnavigable).collect();
    let file = write_temp(&amsua_bytes(&records));
    assert!(matches!(
        Noaa1bReader::open(file.path(), ReaderConfig::default()),
        Err(Noaa1bError::NoUsableLines)
    ));
}

#[test]
fn test_open_rejects_invalid_config() {
    init();
    let file = write_temp(&amsua_bytes(&five_records()));
    assert!(matches!(
        Noaa1bReader::open(file.path(), ReaderConfig::default().with_tile_rows(0)),
        Err(Noaa1bError::Config(_))
    ));
    assert!(matches!(
        Noaa1bReader::open(file.path(), ReaderConfig::default().with_cache_size_bytes(0)),
        Err(Noaa1bError::Config(_))
    ));
}

#[test]
fn test_truncated_file_reports_io_error() {
    init();
    let mut bytes = amsua_bytes(&five_records());
    // Cut inside the last record's attribute prefix
    bytes.truncate(bytes.len() - RECORD_SIZE + 16);
    let file = write_temp(&bytes);
    match Noaa1bReader::open(file.path(), ReaderConfig::default()) {
        Err(e) => assert!(e.is_io(), "unexpected error {:?}", e),
        Ok(_) => panic!("truncated file opened"),
    }
}
