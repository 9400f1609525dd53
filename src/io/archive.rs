use crate::io::fields::{Endian, FieldLayout, FieldView};
use crate::types::{ArchiveInfo, Noaa1bResult};
use std::ops::Range;

/// Bytes read from the start of a file for archive header detection
pub const DETECT_SIZE: usize = 512;

/// Known archive header layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Archive Retrieval System header (version 2 and later)
    Ars,
    /// Terabit memory header (version 1)
    Tbm,
}

const ARS_PRINTABLE: [Range<usize>; 1] = [0..187];

// Dataset name and channel selection are skipped
const TBM_PRINTABLE: [Range<usize>; 3] = [0..30, 74..97, 117..119];

impl ArchiveKind {
    /// Detection order. Every ARS header also passes the TBM checks.
    pub const PRIORITY: [ArchiveKind; 2] = [ArchiveKind::Ars, ArchiveKind::Tbm];

    pub fn name(&self) -> &'static str {
        match self {
            ArchiveKind::Ars => "ARS",
            ArchiveKind::Tbm => "TBM",
        }
    }

    pub fn header_size(&self) -> usize {
        match self {
            ArchiveKind::Ars => 512,
            ArchiveKind::Tbm => 122,
        }
    }

    fn layout_name(&self) -> &'static str {
        match self {
            ArchiveKind::Ars => "ars_archive",
            ArchiveKind::Tbm => "tbm_archive",
        }
    }

    fn printable_ranges(&self) -> &'static [Range<usize>] {
        match self {
            ArchiveKind::Ars => &ARS_PRINTABLE,
            ArchiveKind::Tbm => &TBM_PRINTABLE,
        }
    }

    /// True if the buffer is long enough and every checked range is
    /// printable ASCII (32 to 127 inclusive)
    pub fn is_compatible(&self, bytes: &[u8]) -> bool {
        if bytes.len() < self.header_size() {
            return false;
        }
        self.printable_ranges()
            .iter()
            .all(|r| bytes[r.clone()].iter().all(|&b| (32..=127).contains(&b)))
    }
}

/// Fields only present in ARS headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArsFields {
    pub order_creation_year: Option<u32>,
    pub order_creation_day: Option<u32>,
    pub processing_site: String,
    pub orbit_type: String,
    pub data_format: String,
    pub record_size: Option<usize>,
}

/// Archive header preceding the data header in some files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    kind: ArchiveKind,
    dataset_name: String,
    start_hour: Option<u32>,
    start_minute: Option<u32>,
    duration_minutes: Option<u32>,
    channel_selection: Vec<bool>,
    sensor_word_size: Option<u32>,
    ars: Option<ArsFields>,
}

/// Try each known layout in priority order and decode the first
/// compatible one.
pub fn detect(bytes: &[u8]) -> Noaa1bResult<Option<ArchiveHeader>> {
    for kind in ArchiveKind::PRIORITY {
        if kind.is_compatible(bytes) {
            log::debug!("Detected {} archive header", kind.name());
            return ArchiveHeader::decode(kind, bytes).map(Some);
        }
    }
    log::debug!("No archive header detected");
    Ok(None)
}

fn parse_number<T: std::str::FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

impl ArchiveHeader {
    /// Decode a header of a known kind without checking compatibility
    pub fn decode(kind: ArchiveKind, bytes: &[u8]) -> Noaa1bResult<Self> {
        let layout = FieldLayout::load(kind.layout_name())?;
        let view = FieldView::new(bytes, Endian::Big);

        let channel_selection = layout
            .get_bytes("channelSelection", &view)?
            .iter()
            .map(|&b| b == b'Y')
            .collect();

        let ars = match kind {
            ArchiveKind::Ars => Some(ArsFields {
                order_creation_year: parse_number(&layout.get_string("orderCreationYear", &view)?),
                order_creation_day: parse_number(&layout.get_string("orderCreationDay", &view)?),
                processing_site: layout.get_string("processingSite", &view)?,
                orbit_type: layout.get_string("orbitType", &view)?,
                data_format: layout.get_string("dataFormat", &view)?,
                record_size: parse_number(&layout.get_string("recordSize", &view)?),
            }),
            ArchiveKind::Tbm => None,
        };

        Ok(Self {
            kind,
            dataset_name: layout.get_string("datasetName", &view)?,
            start_hour: parse_number(&layout.get_string("startHour", &view)?),
            start_minute: parse_number(&layout.get_string("startMinute", &view)?),
            duration_minutes: parse_number(&layout.get_string("durationMinutes", &view)?),
            channel_selection,
            sensor_word_size: parse_number(&layout.get_string("sensorWordSize", &view)?),
            ars,
        })
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    pub fn header_size(&self) -> usize {
        self.kind.header_size()
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// One flag per possible channel, true where selected
    pub fn channel_selection(&self) -> &[bool] {
        &self.channel_selection
    }

    /// Bits per raw sample, `None` if the field is not a number
    pub fn sensor_word_size(&self) -> Option<u32> {
        self.sensor_word_size
    }

    pub fn start_hour(&self) -> Option<u32> {
        self.start_hour
    }

    pub fn start_minute(&self) -> Option<u32> {
        self.start_minute
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    pub fn order_creation_year(&self) -> Option<u32> {
        self.ars.as_ref().and_then(|a| a.order_creation_year)
    }

    pub fn order_creation_day(&self) -> Option<u32> {
        self.ars.as_ref().and_then(|a| a.order_creation_day)
    }

    pub fn processing_site(&self) -> Option<&str> {
        self.ars.as_ref().map(|a| a.processing_site.as_str())
    }

    pub fn orbit_type(&self) -> Option<&str> {
        self.ars.as_ref().map(|a| a.orbit_type.as_str())
    }

    pub fn data_format(&self) -> Option<&str> {
        self.ars.as_ref().map(|a| a.data_format.as_str())
    }

    pub fn record_size(&self) -> Option<usize> {
        self.ars.as_ref().and_then(|a| a.record_size)
    }

    pub fn to_info(&self) -> ArchiveInfo {
        ArchiveInfo {
            kind: self.kind.name().to_string(),
            header_size: self.header_size(),
            dataset_name: self.dataset_name.clone(),
            sensor_word_size: self.sensor_word_size,
            channel_selection: self.channel_selection.clone(),
        }
    }
}
