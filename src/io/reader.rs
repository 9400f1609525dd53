use crate::config::ReaderConfig;
use crate::core::instrument::Instrument;
use crate::core::line_map::{LineEntry, LineMap};
use crate::io::cache::{lock_cache, SharedCache, TileCache};
use crate::io::file::{Noaa1bFile, RecordExtent};
use crate::io::grid::{lock_source, RecordSource, SharedSource, SwathGrid};
use crate::types::{
    CalibrationType, FileMetadata, NavigationType, Noaa1bError, Noaa1bResult, VariableKind,
    SCAN_TIME_VARIABLE,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A variable exposed by the reader
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub units: &'static str,
}

/// Build the logical line map from the attribute prefix of every record
pub fn build_line_map(file: &mut Noaa1bFile) -> Noaa1bResult<LineMap> {
    let records = file.record_count();
    if records == 0 {
        return Err(Noaa1bError::NoUsableLines);
    }

    let mut scratch = Vec::new();
    let lines = file
        .read_record(records - 1, RecordExtent::Attributes, &mut scratch)?
        .scan_line()? as usize;

    let mut entries = Vec::with_capacity(records);
    for index in 0..records {
        let record = file.read_record(index, RecordExtent::Attributes, &mut scratch)?;
        entries.push(LineEntry {
            scan_line: record.scan_line()?,
            navigable: record.is_navigation_usable()?,
        });
    }
    LineMap::build(lines, entries)
}

/// Calibration used for a channel grid
fn grid_calibration(instrument: Instrument, channel: usize) -> Noaa1bResult<CalibrationType> {
    Ok(if instrument.descriptor().is_thermal(channel)? {
        CalibrationType::Celsius
    } else {
        CalibrationType::Albedo
    })
}

fn poisoned(what: &str) -> Noaa1bError {
    Noaa1bError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{} lock poisoned", what),
    ))
}

/// NOAA 1b swath reader exposing channels, navigation and scan time as grids
#[derive(Debug)]
pub struct Noaa1bReader {
    config: ReaderConfig,
    source: SharedSource,
    line_map: Arc<LineMap>,
    instrument: Instrument,
    variables: Vec<Variable>,
    metadata: FileMetadata,
    /// One tile cache per variable name, shared by every grid handle
    caches: Mutex<HashMap<String, SharedCache>>,
}

impl Noaa1bReader {
    pub fn open<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Noaa1bResult<Self> {
        let file = Noaa1bFile::open(path, config.byte_swapped)?;
        Self::from_file(file, config)
    }

    /// Build a reader over an already open file
    pub fn from_file(mut file: Noaa1bFile, config: ReaderConfig) -> Noaa1bResult<Self> {
        config.validate()?;
        let line_map = build_line_map(&mut file)?;
        let instrument = file.instrument();
        let descriptor = instrument.descriptor();

        let mut variables = Vec::with_capacity(descriptor.channel_count() + 6);
        for channel in 1..=descriptor.channel_count() {
            let kind = VariableKind::Channel {
                channel,
                calibration: grid_calibration(instrument, channel)?,
            };
            variables.push(Variable {
                name: descriptor.channel_name(channel)?.to_string(),
                kind,
                units: kind.units(),
            });
        }
        for nav in NavigationType::ALL {
            let kind = VariableKind::Navigation(nav);
            variables.push(Variable {
                name: nav.variable_name().to_string(),
                kind,
                units: kind.units(),
            });
        }
        variables.push(Variable {
            name: SCAN_TIME_VARIABLE.to_string(),
            kind: VariableKind::ScanTime,
            units: VariableKind::ScanTime.units(),
        });

        let header = file.data_header();
        let metadata = FileMetadata {
            spacecraft: header.spacecraft().to_string(),
            instrument: instrument.name().to_string(),
            data_format: format!("NOAA 1b version {} {}", header.format_version(), instrument),
            format_version: header.format_version(),
            start_time: header.start_date(),
            end_time: header.end_date(),
            record_count: header.record_count(),
            header_count: header.header_count(),
            record_size: header.record_size(),
            dataset_name: header.dataset_name().to_string(),
            creation_site: header.creation_site().to_string(),
            rows: line_map.len(),
            columns: descriptor.sample_count(),
            archive: file.archive_header().map(|a| a.to_info()),
        };

        log::info!(
            "Opened {} {} swath: {} rows x {} columns, {} variables",
            metadata.spacecraft,
            metadata.instrument,
            metadata.rows,
            metadata.columns,
            variables.len()
        );

        Ok(Self {
            config,
            source: RecordSource::shared(file),
            line_map: Arc::new(line_map),
            instrument,
            variables,
            metadata,
            caches: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Lazily decoded grid for a variable
    pub fn variable(&self, name: &str) -> Noaa1bResult<SwathGrid> {
        let variable = self
            .variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| Noaa1bError::InvalidArgument(format!("No variable named {}", name)))?;

        let cache = {
            let mut caches = self.caches.lock().map_err(|_| poisoned("tile cache map"))?;
            Arc::clone(
                caches
                    .entry(variable.name.clone())
                    .or_insert_with(|| TileCache::shared(self.config.cache_size_bytes)),
            )
        };

        Ok(SwathGrid::with_cache(
            &variable.name,
            variable.kind,
            Arc::clone(&self.source),
            Arc::clone(&self.line_map),
            self.metadata.columns,
            &self.config,
            cache,
        ))
    }

    /// Calibrated values for one 1-based channel of one logical row,
    /// `None` where the row has no usable data
    pub fn calibrated_row(
        &self,
        channel: usize,
        row: usize,
        calibration: CalibrationType,
    ) -> Noaa1bResult<Option<Vec<f64>>> {
        self.instrument.descriptor().check_channel(channel)?;
        if row >= self.line_map.len() {
            return Err(Noaa1bError::OutOfBounds(format!(
                "Row {} not in [0, {})",
                row,
                self.line_map.len()
            )));
        }
        let Some(index) = self.line_map.record_index(row) else {
            return Ok(None);
        };

        let mut source = lock_source(&self.source)?;
        source.with_record(index, RecordExtent::Full, |record| {
            if record.is_sensor_data_usable()? && record.is_calibration_usable()? {
                record.calibrated_data(channel, calibration).map(Some)
            } else {
                Ok(None)
            }
        })
    }

    /// Release the file. Grids still alive keep it open until dropped.
    pub fn close(self) -> Noaa1bResult<()> {
        let caches = self
            .caches
            .into_inner()
            .map_err(|_| poisoned("tile cache map"))?;
        for cache in caches.values() {
            lock_cache(cache)?.clear();
        }

        match Arc::try_unwrap(self.source) {
            Ok(mutex) => {
                let source = mutex.into_inner().map_err(|_| poisoned("record source"))?;
                source.into_file().close()
            }
            Err(_) => {
                log::debug!("Grids still reference the file, closing on last drop");
                Ok(())
            }
        }
    }
}
