//! Table-driven binary field decoding
//!
//! Each record type has an XML layout resource mapping field names to byte
//! offsets, element types and optional scale divisors:
//!
//! ```xml
//! <layout name="amsua_record" size="2560">
//!   <field name="qualityIndicator" offset="24" type="u32"/>
//!   <field name="scanType" offset="12" type="bits" bit="14" bits="2"/>
//!   <field name="ch1ZerothOrder" offset="80" type="i32" scale="1e9"/>
//! </layout>
//! ```

use crate::types::{Noaa1bError, Noaa1bResult};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;

/// Embedded layout resources
const LAYOUTS: &[(&str, &str)] = &[
    ("data_header", include_str!("layouts/data_header.xml")),
    ("amsua_header", include_str!("layouts/amsua_header.xml")),
    ("amsub_header", include_str!("layouts/amsub_header.xml")),
    ("mhs_header", include_str!("layouts/mhs_header.xml")),
    ("hirs4_header", include_str!("layouts/hirs4_header.xml")),
    ("amsua_record", include_str!("layouts/amsua_record.xml")),
    ("amsub_record", include_str!("layouts/amsub_record.xml")),
    ("mhs_record", include_str!("layouts/mhs_record.xml")),
    ("hirs4_record", include_str!("layouts/hirs4_record.xml")),
    ("tbm_archive", include_str!("layouts/tbm_archive.xml")),
    ("ars_archive", include_str!("layouts/ars_archive.xml")),
];

#[derive(Debug, Deserialize)]
struct LayoutDocument {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@size")]
    size: usize,
    #[serde(rename = "field", default)]
    fields: Vec<FieldDocument>,
}

#[derive(Debug, Deserialize)]
struct FieldDocument {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@offset")]
    offset: usize,
    #[serde(rename = "@type")]
    field_type: FieldType,
    #[serde(rename = "@count")]
    count: Option<usize>,
    #[serde(rename = "@scale")]
    scale: Option<f64>,
    #[serde(rename = "@bit")]
    bit: Option<u32>,
    #[serde(rename = "@bits")]
    bits: Option<u32>,
}

/// Element type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    Ascii,
    Bits,
}

impl FieldType {
    /// Element size in bytes (characters for ascii)
    pub fn element_size(&self) -> usize {
        match self {
            FieldType::U8 | FieldType::I8 | FieldType::Ascii => 1,
            FieldType::U16 | FieldType::I16 => 2,
            FieldType::U32 | FieldType::I32 => 4,
            FieldType::Bits => 0,
        }
    }
}

/// Byte order of the source data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub fn from_byte_swapped(byte_swapped: bool) -> Self {
        if byte_swapped {
            Endian::Little
        } else {
            Endian::Big
        }
    }

    fn read_u16(&self, buf: &[u8]) -> u16 {
        match self {
            Endian::Big => BigEndian::read_u16(buf),
            Endian::Little => LittleEndian::read_u16(buf),
        }
    }

    fn read_u32(&self, buf: &[u8]) -> u32 {
        match self {
            Endian::Big => BigEndian::read_u32(buf),
            Endian::Little => LittleEndian::read_u32(buf),
        }
    }
}

/// A byte buffer together with its byte order
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    bytes: &'a [u8],
    endian: Endian,
}

impl<'a> FieldView<'a> {
    pub fn new(bytes: &'a [u8], endian: Endian) -> Self {
        Self { bytes, endian }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    fn slice(&self, offset: usize, len: usize) -> Noaa1bResult<&'a [u8]> {
        self.bytes.get(offset..offset + len).ok_or_else(|| {
            Noaa1bError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "field bytes {}..{} beyond buffer of {} bytes",
                    offset,
                    offset + len,
                    self.bytes.len()
                ),
            ))
        })
    }

    fn read_integer(&self, offset: usize, field_type: FieldType) -> Noaa1bResult<i64> {
        let buf = self.slice(offset, field_type.element_size())?;
        let value = match field_type {
            FieldType::U8 => buf[0] as i64,
            FieldType::I8 => buf[0] as i8 as i64,
            FieldType::U16 => self.endian.read_u16(buf) as i64,
            FieldType::I16 => self.endian.read_u16(buf) as i16 as i64,
            FieldType::U32 => self.endian.read_u32(buf) as i64,
            FieldType::I32 => self.endian.read_u32(buf) as i32 as i64,
            FieldType::Ascii | FieldType::Bits => {
                return Err(Noaa1bError::Layout(format!(
                    "{:?} is not an integer element type",
                    field_type
                )))
            }
        };
        Ok(value)
    }
}

/// One named field in a layout
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub offset: usize,
    pub field_type: FieldType,
    pub count: usize,
    /// Divisor applied by `get_double`
    pub scale: f64,
    /// First bit for bit fields, MSB-first from `offset`
    pub bit: u32,
    pub bits: u32,
}

impl Field {
    /// Bytes spanned by the field
    pub fn byte_len(&self) -> usize {
        match self.field_type {
            FieldType::Bits => bit_word_size(self.bit, self.bits),
            other => other.element_size() * self.count,
        }
    }
}

// Smallest 1, 2, 4 or 8 byte word holding bit + bits
fn bit_word_size(bit: u32, bits: u32) -> usize {
    match (bit + bits + 7) / 8 {
        0 | 1 => 1,
        2 => 2,
        3 | 4 => 4,
        _ => 8,
    }
}

/// Field layout for one record type
#[derive(Debug, Clone)]
pub struct FieldLayout {
    name: String,
    size: usize,
    fields: HashMap<String, Field>,
}

impl FieldLayout {
    /// Load an embedded layout resource by record type name
    pub fn load(record_type: &str) -> Noaa1bResult<Self> {
        let source = LAYOUTS
            .iter()
            .find(|(name, _)| *name == record_type)
            .map(|(_, source)| *source)
            .ok_or_else(|| Noaa1bError::MissingLayout(record_type.to_string()))?;

        let layout = Self::parse(source)?;
        log::debug!(
            "Loaded layout {} ({} bytes, {} fields)",
            layout.name,
            layout.size,
            layout.fields.len()
        );
        Ok(layout)
    }

    /// Parse a layout document
    pub fn parse(xml: &str) -> Noaa1bResult<Self> {
        let doc: LayoutDocument = from_str(xml)
            .map_err(|e| Noaa1bError::Layout(format!("Failed to parse layout XML: {}", e)))?;

        let mut fields = HashMap::with_capacity(doc.fields.len());
        for f in doc.fields {
            let field = Field {
                offset: f.offset,
                field_type: f.field_type,
                count: f.count.unwrap_or(1),
                scale: f.scale.unwrap_or(1.0),
                bit: f.bit.unwrap_or(0),
                bits: f.bits.unwrap_or(0),
                name: f.name,
            };

            if field.count == 0 || field.scale == 0.0 {
                return Err(Noaa1bError::Layout(format!(
                    "Field {} in {} has zero count or scale",
                    field.name, doc.name
                )));
            }
            if field.field_type == FieldType::Bits && (field.bits == 0 || field.bits > 32) {
                return Err(Noaa1bError::Layout(format!(
                    "Bit field {} in {} must span 1 to 32 bits",
                    field.name, doc.name
                )));
            }
            if field.offset + field.byte_len() > doc.size {
                return Err(Noaa1bError::Layout(format!(
                    "Field {} in {} ends at {} beyond layout size {}",
                    field.name,
                    doc.name,
                    field.offset + field.byte_len(),
                    doc.size
                )));
            }
            if fields.insert(field.name.clone(), field).is_some() {
                return Err(Noaa1bError::Layout(format!(
                    "Duplicate field in layout {}",
                    doc.name
                )));
            }
        }

        Ok(Self {
            name: doc.name,
            size: doc.size,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes of the record described by this layout
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Check that every named field exists
    pub fn require<S: AsRef<str>>(&self, names: &[S]) -> Noaa1bResult<()> {
        for name in names {
            self.field(name.as_ref())?;
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Noaa1bResult<&Field> {
        self.fields.get(name).ok_or_else(|| Noaa1bError::MissingField {
            layout: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// First element of an integer or bit field
    pub fn get_long(&self, name: &str, view: &FieldView) -> Noaa1bResult<i64> {
        let field = self.field(name)?;
        match field.field_type {
            FieldType::Bits => self.read_bits(field, view).map(|v| v as i64),
            other => view.read_integer(field.offset, other),
        }
    }

    /// Integer field divided by its scale
    pub fn get_double(&self, name: &str, view: &FieldView) -> Noaa1bResult<f64> {
        let field = self.field(name)?;
        let raw = self.get_long(name, view)?;
        Ok(raw as f64 / field.scale)
    }

    /// Scaled field rounded to single precision, the precision the
    /// calibration coefficients are defined in
    pub fn get_float(&self, name: &str, view: &FieldView) -> Noaa1bResult<f64> {
        self.get_double(name, view).map(|v| v as f32 as f64)
    }

    pub fn get_long_array(&self, name: &str, view: &FieldView) -> Noaa1bResult<Vec<i64>> {
        let field = self.field(name)?;
        let size = field.field_type.element_size();
        if field.field_type == FieldType::Bits || field.field_type == FieldType::Ascii {
            return Err(Noaa1bError::Layout(format!(
                "Field {} in {} is not an integer array",
                name, self.name
            )));
        }
        (0..field.count)
            .map(|i| view.read_integer(field.offset + i * size, field.field_type))
            .collect()
    }

    pub fn get_int_array(&self, name: &str, view: &FieldView) -> Noaa1bResult<Vec<i32>> {
        Ok(self
            .get_long_array(name, view)?
            .into_iter()
            .map(|v| v as i32)
            .collect())
    }

    /// Integer array truncated to 16 bits
    pub fn get_short_array(&self, name: &str, view: &FieldView) -> Noaa1bResult<Vec<i16>> {
        Ok(self
            .get_long_array(name, view)?
            .into_iter()
            .map(|v| v as i16)
            .collect())
    }

    /// Raw bytes of a field
    pub fn get_bytes<'a>(&self, name: &str, view: &FieldView<'a>) -> Noaa1bResult<&'a [u8]> {
        let field = self.field(name)?;
        view.slice(field.offset, field.byte_len())
    }

    /// ASCII field with surrounding whitespace and NULs trimmed
    pub fn get_string(&self, name: &str, view: &FieldView) -> Noaa1bResult<String> {
        let bytes = self.get_bytes(name, view)?;
        let text: String = bytes.iter().map(|&b| b as char).collect();
        Ok(text
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string())
    }

    pub fn get_bits(&self, name: &str, view: &FieldView) -> Noaa1bResult<u32> {
        let field = self.field(name)?;
        if field.field_type != FieldType::Bits {
            return Err(Noaa1bError::Layout(format!(
                "Field {} in {} is not a bit field",
                name, self.name
            )));
        }
        self.read_bits(field, view)
    }

    fn read_bits(&self, field: &Field, view: &FieldView) -> Noaa1bResult<u32> {
        let word_size = bit_word_size(field.bit, field.bits);
        let buf = view.slice(field.offset, word_size)?;
        let word: u64 = match word_size {
            1 => buf[0] as u64,
            2 => view.endian.read_u16(buf) as u64,
            4 => view.endian.read_u32(buf) as u64,
            _ => match view.endian {
                Endian::Big => BigEndian::read_u64(buf),
                Endian::Little => LittleEndian::read_u64(buf),
            },
        };
        let shift = (word_size as u32) * 8 - field.bit - field.bits;
        let mask = (1u64 << field.bits) - 1;
        Ok(((word >> shift) & mask) as u32)
    }
}
