use crate::config::ReaderConfig;
use crate::io::cache::{lock_cache, CacheStats, SharedCache, TileCache};
use crate::io::file::{Noaa1bFile, RecordExtent};
use crate::io::record::DataRecord;
use crate::core::line_map::LineMap;
use crate::types::{
    NavigationType, Noaa1bError, Noaa1bResult, VariableKind, MISSING_FLOAT, MISSING_SHORT,
    MISSING_TIME, SHORT_SCALE,
};
use ndarray::{s, Array2, Axis};
use std::io;
use std::ops::Range;
use std::sync::{Arc, Mutex};

/// Typed tile contents, rows x columns
#[derive(Debug, Clone, PartialEq)]
pub enum TileData {
    /// Values x 100, missing = -32768
    Short(Array2<i16>),
    /// Degrees, missing = NaN
    Float(Array2<f32>),
    /// Epoch milliseconds, missing = -1
    Long(Array2<i64>),
}

impl TileData {
    pub fn dim(&self) -> (usize, usize) {
        match self {
            TileData::Short(a) => a.dim(),
            TileData::Float(a) => a.dim(),
            TileData::Long(a) => a.dim(),
        }
    }

    /// Multiplier from stored to physical value
    pub fn scale(&self) -> f64 {
        match self {
            TileData::Short(_) => SHORT_SCALE,
            TileData::Float(_) | TileData::Long(_) => 1.0,
        }
    }

    /// Physical value at a cell, `None` if missing
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            TileData::Short(a) => a
                .get((row, col))
                .filter(|&&v| v != MISSING_SHORT)
                .map(|&v| v as f64 * SHORT_SCALE),
            TileData::Float(a) => a
                .get((row, col))
                .filter(|v| !v.is_nan())
                .map(|&v| v as f64),
            TileData::Long(a) => a
                .get((row, col))
                .filter(|&&v| v != MISSING_TIME)
                .map(|&v| v as f64),
        }
    }

    fn byte_size(&self) -> usize {
        let (rows, cols) = self.dim();
        let element = match self {
            TileData::Short(_) => std::mem::size_of::<i16>(),
            TileData::Float(_) => std::mem::size_of::<f32>(),
            TileData::Long(_) => std::mem::size_of::<i64>(),
        };
        rows * cols * element
    }
}

/// A decoded block of full-width rows
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub start_row: usize,
    pub data: TileData,
}

impl Tile {
    pub fn rows(&self) -> Range<usize> {
        self.start_row..self.start_row + self.data.dim().0
    }

    pub fn byte_size(&self) -> usize {
        self.data.byte_size()
    }
}

/// Tile geometry over the logical grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tiling {
    pub rows: usize,
    pub columns: usize,
    pub tile_rows: usize,
}

impl Tiling {
    pub fn new(rows: usize, columns: usize, tile_rows: usize) -> Self {
        Self {
            rows,
            columns,
            tile_rows: tile_rows.max(1),
        }
    }

    /// Tile dimensions as (rows, columns)
    pub fn tile_dimensions(&self) -> (usize, usize) {
        (self.tile_rows, self.columns)
    }

    pub fn tile_count(&self) -> usize {
        (self.rows + self.tile_rows - 1) / self.tile_rows
    }

    pub fn tile_of_row(&self, row: usize) -> usize {
        row / self.tile_rows
    }

    /// Rows covered by a tile, the last tile may be short
    pub fn tile_rows_range(&self, tile: usize) -> Range<usize> {
        let start = tile * self.tile_rows;
        start..(start + self.tile_rows).min(self.rows)
    }
}

/// Open file plus the scratch buffer reused for every record read
#[derive(Debug)]
pub struct RecordSource {
    file: Noaa1bFile,
    scratch: Vec<u8>,
}

/// Record source shared by the grids of one reader
pub type SharedSource = Arc<Mutex<RecordSource>>;

impl RecordSource {
    pub fn new(file: Noaa1bFile) -> Self {
        Self {
            file,
            scratch: Vec::new(),
        }
    }

    pub fn shared(file: Noaa1bFile) -> SharedSource {
        Arc::new(Mutex::new(Self::new(file)))
    }

    pub fn into_file(self) -> Noaa1bFile {
        self.file
    }

    /// Read one record and decode it inside `f`; the record cannot
    /// escape the call.
    pub fn with_record<T, F>(&mut self, index: usize, extent: RecordExtent, f: F) -> Noaa1bResult<T>
    where
        F: FnOnce(&DataRecord) -> Noaa1bResult<T>,
    {
        let record = self.file.read_record(index, extent, &mut self.scratch)?;
        f(&record)
    }
}

pub(crate) fn lock_source(source: &SharedSource) -> Noaa1bResult<std::sync::MutexGuard<'_, RecordSource>> {
    source.lock().map_err(|_| {
        Noaa1bError::Io(io::Error::new(
            io::ErrorKind::Other,
            "record source lock poisoned",
        ))
    })
}

/// Scale a physical value into a 16-bit grid cell, rounding half up.
/// Values outside the representable range become missing.
pub fn to_short(value: f64) -> i16 {
    if value.is_nan() {
        return MISSING_SHORT;
    }
    let scaled = (value / SHORT_SCALE + 0.5).floor();
    if scaled > i16::MAX as f64 || scaled <= i16::MIN as f64 {
        MISSING_SHORT
    } else {
        scaled as i16
    }
}

/// Lazily decoded, read-only 2D view of one variable over the swath
#[derive(Debug)]
pub struct SwathGrid {
    name: String,
    kind: VariableKind,
    source: SharedSource,
    line_map: Arc<LineMap>,
    tiling: Tiling,
    cache: SharedCache,
}

impl SwathGrid {
    pub fn new(
        name: &str,
        kind: VariableKind,
        source: SharedSource,
        line_map: Arc<LineMap>,
        columns: usize,
        config: &ReaderConfig,
    ) -> Self {
        let cache = TileCache::shared(config.cache_size_bytes);
        Self::with_cache(name, kind, source, line_map, columns, config, cache)
    }

    /// Grid that decodes into an existing cache, so earlier handles of
    /// the same variable share their tiles
    pub fn with_cache(
        name: &str,
        kind: VariableKind,
        source: SharedSource,
        line_map: Arc<LineMap>,
        columns: usize,
        config: &ReaderConfig,
        cache: SharedCache,
    ) -> Self {
        let tiling = Tiling::new(line_map.len(), columns, config.tile_rows);
        log::debug!(
            "Grid {}: {}x{} in {} tiles",
            name,
            tiling.rows,
            tiling.columns,
            tiling.tile_count()
        );
        Self {
            name: name.to_string(),
            kind,
            source,
            line_map,
            tiling,
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn units(&self) -> &'static str {
        self.kind.units()
    }

    /// Grid dimensions as (rows, columns)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.tiling.rows, self.tiling.columns)
    }

    pub fn tiling(&self) -> Tiling {
        self.tiling
    }

    /// Multiplier from stored to physical values
    pub fn scale(&self) -> f64 {
        match self.kind {
            VariableKind::Channel { .. } => SHORT_SCALE,
            VariableKind::Navigation(nav) if !nav.is_location() => SHORT_SCALE,
            _ => 1.0,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        lock_cache(&self.cache)
            .map(|cache| cache.stats())
            .unwrap_or_default()
    }

    /// Read a tile by index, decoding it on a cache miss
    pub fn read_tile(&mut self, tile: usize) -> Noaa1bResult<Arc<Tile>> {
        if tile >= self.tiling.tile_count() {
            return Err(Noaa1bError::OutOfBounds(format!(
                "Tile {} not in [0, {}) for {}",
                tile,
                self.tiling.tile_count(),
                self.name
            )));
        }
        if let Some(cached) = lock_cache(&self.cache)?.get(tile) {
            return Ok(cached);
        }

        let rows = self.tiling.tile_rows_range(tile);
        log::debug!("Decoding {} rows {:?}", self.name, rows);
        let data = self.decode_rows(rows.clone())?;
        let decoded = Arc::new(Tile {
            start_row: rows.start,
            data,
        });
        lock_cache(&self.cache)?.insert(tile, Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Read an arbitrary row range, full width
    pub fn read_rows(&mut self, rows: Range<usize>) -> Noaa1bResult<TileData> {
        if rows.start > rows.end || rows.end > self.tiling.rows {
            return Err(Noaa1bError::OutOfBounds(format!(
                "Rows {:?} not within [0, {}) for {}",
                rows, self.tiling.rows, self.name
            )));
        }

        let mut out = self.empty_data(rows.len());
        if rows.is_empty() {
            return Ok(out);
        }
        let first = self.tiling.tile_of_row(rows.start);
        let last = self.tiling.tile_of_row(rows.end - 1);
        for index in first..=last {
            let tile = self.read_tile(index)?;
            let covered = tile.rows();
            let start = covered.start.max(rows.start);
            let end = covered.end.min(rows.end);
            let src = s![start - covered.start..end - covered.start, ..];
            let dst = s![start - rows.start..end - rows.start, ..];
            match (&mut out, &tile.data) {
                (TileData::Short(o), TileData::Short(t)) => o.slice_mut(dst).assign(&t.slice(src)),
                (TileData::Float(o), TileData::Float(t)) => o.slice_mut(dst).assign(&t.slice(src)),
                (TileData::Long(o), TileData::Long(t)) => o.slice_mut(dst).assign(&t.slice(src)),
                _ => {
                    return Err(Noaa1bError::Layout(format!(
                        "Tile type mismatch in {}",
                        self.name
                    )))
                }
            }
        }
        Ok(out)
    }

    pub fn read_all(&mut self) -> Noaa1bResult<TileData> {
        self.read_rows(0..self.tiling.rows)
    }

    /// Physical value at a cell with scaling applied, `None` if missing
    pub fn value(&mut self, row: usize, col: usize) -> Noaa1bResult<Option<f64>> {
        if row >= self.tiling.rows || col >= self.tiling.columns {
            return Err(Noaa1bError::OutOfBounds(format!(
                "Cell ({}, {}) outside {}x{} grid {}",
                row, col, self.tiling.rows, self.tiling.columns, self.name
            )));
        }
        let tile = self.read_tile(self.tiling.tile_of_row(row))?;
        Ok(tile.data.value(row - tile.start_row, col))
    }

    /// Grids are read-only
    pub fn write_tile(&mut self, _tile: &Tile) -> Noaa1bResult<()> {
        Err(Noaa1bError::ReadOnly)
    }

    fn empty_data(&self, rows: usize) -> TileData {
        let shape = (rows, self.tiling.columns);
        match self.kind {
            VariableKind::Channel { .. } => TileData::Short(Array2::from_elem(shape, MISSING_SHORT)),
            VariableKind::Navigation(nav) if nav.is_location() => {
                TileData::Float(Array2::from_elem(shape, MISSING_FLOAT))
            }
            VariableKind::Navigation(_) => TileData::Short(Array2::from_elem(shape, MISSING_SHORT)),
            VariableKind::ScanTime => TileData::Long(Array2::from_elem(shape, MISSING_TIME)),
        }
    }

    fn decode_rows(&self, rows: Range<usize>) -> Noaa1bResult<TileData> {
        let mut data = self.empty_data(rows.len());
        let mut source = lock_source(&self.source)?;

        for (i, row) in rows.enumerate() {
            // Unmapped rows keep the missing fill
            let Some(index) = self.line_map.record_index(row) else {
                continue;
            };

            match (self.kind, &mut data) {
                (VariableKind::Channel { channel, calibration }, TileData::Short(out)) => {
                    let values = source.with_record(index, RecordExtent::Full, |record| {
                        if record.is_sensor_data_usable()? && record.is_calibration_usable()? {
                            record.calibrated_data(channel, calibration).map(Some)
                        } else {
                            Ok(None)
                        }
                    })?;
                    if let Some(values) = values {
                        fill_row(out, i, values.into_iter().map(to_short));
                    }
                }
                (VariableKind::Navigation(nav), data) => {
                    let values = source.with_record(index, RecordExtent::Full, |record| {
                        if record.is_navigation_usable()? {
                            record.navigation_data(nav).map(Some)
                        } else {
                            Ok(None)
                        }
                    })?;
                    if let Some(values) = values {
                        fill_navigation(data, i, nav, values);
                    }
                }
                (VariableKind::ScanTime, TileData::Long(out)) => {
                    let millis = source.with_record(index, RecordExtent::Attributes, |record| {
                        Ok(record.date()?.timestamp_millis())
                    })?;
                    out.row_mut(i).fill(millis);
                }
                _ => {
                    return Err(Noaa1bError::Layout(format!(
                        "Tile type mismatch in {}",
                        self.name
                    )))
                }
            }
        }
        Ok(data)
    }
}

fn fill_row<T, I>(out: &mut Array2<T>, row: usize, values: I)
where
    I: IntoIterator<Item = T>,
{
    for (cell, value) in out.index_axis_mut(Axis(0), row).iter_mut().zip(values) {
        *cell = value;
    }
}

fn fill_navigation(data: &mut TileData, row: usize, nav: NavigationType, values: Vec<f64>) {
    match data {
        TileData::Float(out) if nav.is_location() => {
            fill_row(out, row, values.into_iter().map(|v| v as f32))
        }
        TileData::Short(out) => fill_row(out, row, values.into_iter().map(to_short)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiling_geometry() {
        let tiling = Tiling::new(10, 30, 4);
        assert_eq!(tiling.tile_count(), 3);
        assert_eq!(tiling.tile_rows_range(2), 8..10);
        assert_eq!(tiling.tile_of_row(7), 1);
        assert_eq!(tiling.tile_dimensions(), (4, 30));
    }

    #[test]
    fn test_to_short() {
        assert_eq!(to_short(12.345), 1235);
        assert_eq!(to_short(-0.004), 0);
        assert_eq!(to_short(f64::NAN), MISSING_SHORT);
        assert_eq!(to_short(1e6), MISSING_SHORT);
        assert_eq!(to_short(-327.68), MISSING_SHORT);
    }

    #[test]
    fn test_tile_values() {
        let data = TileData::Short(Array2::from_shape_vec((1, 2), vec![2550, MISSING_SHORT]).unwrap());
        assert_eq!(data.value(0, 0), Some(25.5));
        assert_eq!(data.value(0, 1), None);
        assert_eq!(data.value(1, 0), None);

        let data = TileData::Float(Array2::from_shape_vec((1, 2), vec![1.5, f32::NAN]).unwrap());
        assert_eq!(data.value(0, 0), Some(1.5));
        assert_eq!(data.value(0, 1), None);
        assert_eq!(data.scale(), 1.0);

        let data = TileData::Long(Array2::from_elem((2, 2), MISSING_TIME));
        assert_eq!(data.value(1, 1), None);
        assert_eq!(data.byte_size(), 32);
    }
}
