use crate::core::instrument::Instrument;
use crate::io::archive::{self, ArchiveHeader, DETECT_SIZE};
use crate::io::fields::Endian;
use crate::io::header::{probe_data_type, DataHeader, PROBE_SIZE};
use crate::io::record::DataRecord;
use crate::io::sensors::sensor_format;
use crate::types::{Noaa1bError, Noaa1bResult};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Random access byte source behind a NOAA 1b file
pub trait ByteSource: Read + Seek + Send + std::fmt::Debug {}

impl<T: Read + Seek + Send + std::fmt::Debug> ByteSource for T {}

/// How much of a record to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordExtent {
    /// The whole record
    Full,
    /// Only the attribute prefix: scan line, time and quality
    Attributes,
}

/// An open NOAA 1b file
#[derive(Debug)]
pub struct Noaa1bFile {
    path: PathBuf,
    source: Box<dyn ByteSource>,
    archive: Option<ArchiveHeader>,
    header: DataHeader,
}

// Read up to `len` bytes from `offset`, shorter at end of data
fn read_prefix<R: Read + Seek + ?Sized>(source: &mut R, offset: u64, len: usize) -> Noaa1bResult<Vec<u8>> {
    source.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len);
    let mut limited = (&mut *source).take(len as u64);
    limited.read_to_end(&mut buf)?;
    Ok(buf)
}

impl Noaa1bFile {
    /// Open a file, inflating it into memory if gzip-compressed
    pub fn open<P: AsRef<Path>>(path: P, byte_swapped: bool) -> Noaa1bResult<Self> {
        let path = path.as_ref();
        log::info!("Opening NOAA 1b file: {}", path.display());

        let mut file = File::open(path)?;
        let magic = read_prefix(&mut file, 0, GZIP_MAGIC.len())?;
        file.seek(SeekFrom::Start(0))?;

        if magic == GZIP_MAGIC {
            let mut data = Vec::new();
            GzDecoder::new(file).read_to_end(&mut data)?;
            log::debug!("Inflated {} bytes from gzip input", data.len());
            Self::from_source(path, Box::new(Cursor::new(data)), byte_swapped)
        } else {
            Self::from_source(path, Box::new(file), byte_swapped)
        }
    }

    /// Open from any seekable byte source
    pub fn from_source<P: AsRef<Path>>(
        path: P,
        mut source: Box<dyn ByteSource>,
        byte_swapped: bool,
    ) -> Noaa1bResult<Self> {
        let endian = Endian::from_byte_swapped(byte_swapped);

        let start = read_prefix(source.as_mut(), 0, DETECT_SIZE)?;
        let archive = archive::detect(&start)?;
        let header_offset = archive.as_ref().map(|a| a.header_size()).unwrap_or(0) as u64;

        let probe = read_prefix(source.as_mut(), header_offset, PROBE_SIZE)?;
        let instrument = probe_data_type(&probe, endian)?;
        let header_bytes = read_prefix(
            source.as_mut(),
            header_offset,
            sensor_format(instrument).record_size(),
        )?;
        let header = DataHeader::decode_as(instrument, &header_bytes, endian)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            source,
            archive,
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn archive_header(&self) -> Option<&ArchiveHeader> {
        self.archive.as_ref()
    }

    pub fn data_header(&self) -> &DataHeader {
        &self.header
    }

    pub fn record_count(&self) -> usize {
        self.header.record_count()
    }

    pub fn instrument(&self) -> Instrument {
        self.header.instrument()
    }

    pub fn format_version(&self) -> u32 {
        self.header.format_version()
    }

    /// Byte offset of a data record
    pub fn record_offset(&self, index: usize) -> u64 {
        let archive_size = self.archive.as_ref().map(|a| a.header_size()).unwrap_or(0);
        let header_count = self.header.header_count().max(1);
        (archive_size + self.header.record_size() * (header_count + index)) as u64
    }

    /// Read record bytes into a caller-supplied scratch buffer
    pub fn read_record_bytes(
        &mut self,
        index: usize,
        extent: RecordExtent,
        scratch: &mut Vec<u8>,
    ) -> Noaa1bResult<()> {
        if index >= self.record_count() {
            return Err(Noaa1bError::OutOfBounds(format!(
                "Record {} not in [0, {})",
                index,
                self.record_count()
            )));
        }
        let len = match extent {
            RecordExtent::Full => self.header.record_size(),
            RecordExtent::Attributes => self.header.attribute_size(),
        };
        let offset = self.record_offset(index);

        scratch.clear();
        scratch.resize(len, 0);
        self.source.seek(SeekFrom::Start(offset))?;
        self.source.read_exact(scratch)?;
        Ok(())
    }

    /// Read and wrap a data record. The record borrows the scratch buffer
    /// and cannot outlive the next read.
    pub fn read_record<'a>(
        &'a mut self,
        index: usize,
        extent: RecordExtent,
        scratch: &'a mut Vec<u8>,
    ) -> Noaa1bResult<DataRecord<'a>> {
        self.read_record_bytes(index, extent, scratch)?;
        let bytes: &'a [u8] = scratch.as_slice();
        Ok(self.header.record(bytes))
    }

    /// Release the underlying source
    pub fn close(self) -> Noaa1bResult<()> {
        log::debug!("Closing {}", self.path.display());
        Ok(())
    }
}
