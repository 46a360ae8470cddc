//! Advertising data structures.
//!
//! Each structure is sent as `length | type | payload`, where `length` counts the type byte and
//! the payload.
use crate::codec;
use crate::cursor::{ReadCursor, WriteCursor};

pub const AD_FLAG_LE_LIMITED_DISCOVERABLE: u8 = 0b00000001;
pub const LE_GENERAL_DISCOVERABLE: u8 = 0b00000010;
pub const BR_EDR_NOT_SUPPORTED: u8 = 0b00000100;

/// AD type codes.
pub mod ad_type {
    pub const FLAGS: u8 = 0x01;
    pub const INCOMPLETE_SERVICE_UUIDS_16: u8 = 0x02;
    pub const INCOMPLETE_SERVICE_UUIDS_128: u8 = 0x06;
    pub const SHORTENED_LOCAL_NAME: u8 = 0x08;
    pub const COMPLETE_LOCAL_NAME: u8 = 0x09;
    pub const SERVICE_SOLICITATION_16: u8 = 0x14;
    pub const SERVICE_SOLICITATION_128: u8 = 0x15;
    pub const MANUFACTURER_SPECIFIC_DATA: u8 = 0xff;
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdStructure<'a> {
    /// Device flags and baseband capabilities.
    ///
    /// Must not be used in scan response data.
    Flags(u8),

    /// Little endian 16-bit service UUIDs, concatenated.
    ServiceUuids16(&'a [u8]),
    /// Little endian 128-bit service UUIDs, concatenated.
    ServiceUuids128(&'a [u8]),

    /// 16-bit service solicitation UUIDs.
    ServiceSolicitation16(&'a [u8]),
    /// 128-bit service solicitation UUIDs.
    ServiceSolicitation128(&'a [u8]),

    /// Sets the full (unabbreviated) device name.
    ///
    /// This will be shown to the user when this device is found.
    CompleteLocalName(&'a [u8]),

    /// Sets the shortened device name.
    ShortenedLocalName(&'a [u8]),

    /// Set manufacturer specific data
    ManufacturerSpecificData { company_identifier: u16, payload: &'a [u8] },

    /// An unknown or unimplemented AD structure stored as raw bytes.
    Unknown {
        /// Type byte.
        ty: u8,
        /// Raw data transmitted after the type.
        data: &'a [u8],
    },
}

impl<'a> AdStructure<'a> {
    /// Interpret a payload for the given type code.
    pub fn from_parts(ty: u8, data: &'a [u8]) -> Self {
        match ty {
            ad_type::FLAGS if data.len() == 1 => AdStructure::Flags(data[0]),
            ad_type::INCOMPLETE_SERVICE_UUIDS_16 => AdStructure::ServiceUuids16(data),
            ad_type::INCOMPLETE_SERVICE_UUIDS_128 => AdStructure::ServiceUuids128(data),
            ad_type::SERVICE_SOLICITATION_16 => AdStructure::ServiceSolicitation16(data),
            ad_type::SERVICE_SOLICITATION_128 => AdStructure::ServiceSolicitation128(data),
            ad_type::SHORTENED_LOCAL_NAME => AdStructure::ShortenedLocalName(data),
            ad_type::COMPLETE_LOCAL_NAME => AdStructure::CompleteLocalName(data),
            ad_type::MANUFACTURER_SPECIFIC_DATA if data.len() >= 2 => AdStructure::ManufacturerSpecificData {
                company_identifier: u16::from_le_bytes([data[0], data[1]]),
                payload: &data[2..],
            },
            _ => AdStructure::Unknown { ty, data },
        }
    }

    /// Type code sent on air.
    pub fn ty(&self) -> u8 {
        match self {
            AdStructure::Flags(_) => ad_type::FLAGS,
            AdStructure::ServiceUuids16(_) => ad_type::INCOMPLETE_SERVICE_UUIDS_16,
            AdStructure::ServiceUuids128(_) => ad_type::INCOMPLETE_SERVICE_UUIDS_128,
            AdStructure::ServiceSolicitation16(_) => ad_type::SERVICE_SOLICITATION_16,
            AdStructure::ServiceSolicitation128(_) => ad_type::SERVICE_SOLICITATION_128,
            AdStructure::ShortenedLocalName(_) => ad_type::SHORTENED_LOCAL_NAME,
            AdStructure::CompleteLocalName(_) => ad_type::COMPLETE_LOCAL_NAME,
            AdStructure::ManufacturerSpecificData { .. } => ad_type::MANUFACTURER_SPECIFIC_DATA,
            AdStructure::Unknown { ty, .. } => *ty,
        }
    }

    /// Encode this structure at the cursor position.
    pub fn encode(&self, w: &mut WriteCursor<'_>) -> Result<(), codec::Error> {
        match self {
            AdStructure::Flags(flags) => {
                w.append(&[0x02, ad_type::FLAGS, *flags])?;
            }
            AdStructure::ServiceUuids16(data)
            | AdStructure::ServiceUuids128(data)
            | AdStructure::ServiceSolicitation16(data)
            | AdStructure::ServiceSolicitation128(data)
            | AdStructure::ShortenedLocalName(data)
            | AdStructure::CompleteLocalName(data)
            | AdStructure::Unknown { data, .. } => {
                w.append(&[(data.len() + 1) as u8, self.ty()])?;
                w.append(data)?;
            }
            AdStructure::ManufacturerSpecificData {
                company_identifier,
                payload,
            } => {
                w.append(&[(payload.len() + 3) as u8, ad_type::MANUFACTURER_SPECIFIC_DATA])?;
                w.write(*company_identifier)?;
                w.append(payload)?;
            }
        }
        Ok(())
    }

    /// Encode a sequence of structures into `dest`, returning the number of bytes written.
    pub fn encode_slice(data: &[AdStructure<'_>], dest: &mut [u8]) -> Result<usize, codec::Error> {
        let mut w = WriteCursor::new(dest);
        for item in data.iter() {
            item.encode(&mut w)?;
        }
        Ok(w.len())
    }

    /// Iterate over the structures of a raw advertising or scan response payload.
    pub fn decode(data: &'a [u8]) -> AdStructureIter<'a> {
        AdStructureIter {
            cursor: ReadCursor::new(data),
        }
    }
}

/// Iterator over AD structures in a raw payload.
///
/// Stops at the end of the payload or at zero padding. A length that runs past the end yields
/// one error and ends the iteration.
pub struct AdStructureIter<'d> {
    cursor: ReadCursor<'d>,
}

impl<'d> Iterator for AdStructureIter<'d> {
    type Item = Result<AdStructure<'d>, codec::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.available() == 0 {
            return None;
        }
        let len: u8 = match self.cursor.read() {
            Ok(len) => len,
            Err(e) => return Some(Err(e)),
        };
        if len == 0 {
            self.cursor.remaining();
            return None;
        }
        match self.cursor.slice(len as usize) {
            Ok(data) => Some(Ok(AdStructure::from_parts(data[0], &data[1..]))),
            Err(_) => {
                self.cursor.remaining();
                Some(Err(codec::Error::InvalidValue))
            }
        }
    }
}
