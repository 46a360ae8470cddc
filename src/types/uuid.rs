//! UUID types.

use core::str::FromStr;

use crate::Error;

/// A 16-bit or 128-bit UUID, stored little endian as it goes on air.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Uuid {
    /// 16-bit UUID
    Uuid16([u8; 2]),
    /// 128-bit UUID
    Uuid128([u8; 16]),
}

impl From<u128> for Uuid {
    fn from(data: u128) -> Self {
        Uuid::Uuid128(data.to_le_bytes())
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(data: [u8; 16]) -> Self {
        Uuid::Uuid128(data)
    }
}

impl From<[u8; 2]> for Uuid {
    fn from(data: [u8; 2]) -> Self {
        Uuid::Uuid16(data)
    }
}

impl From<u16> for Uuid {
    fn from(data: u16) -> Self {
        Uuid::Uuid16(data.to_le_bytes())
    }
}

impl Uuid {
    /// Create a new 16-bit UUID.
    pub const fn new_short(val: u16) -> Self {
        Self::Uuid16(val.to_le_bytes())
    }

    /// Create a new 128-bit UUID.
    pub const fn new_long(val: [u8; 16]) -> Self {
        Self::Uuid128(val)
    }

    /// Number of bytes on air, 2 or 16.
    pub fn len(&self) -> usize {
        self.as_raw().len()
    }

    /// True for the 128-bit form.
    pub fn is_long(&self) -> bool {
        matches!(self, Uuid::Uuid128(_))
    }

    /// Get the 16-bit UUID value.
    pub fn as_short(&self) -> Option<u16> {
        match self {
            Uuid::Uuid16(data) => Some(u16::from_le_bytes(*data)),
            Uuid::Uuid128(_) => None,
        }
    }

    /// Raw little endian bytes.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Uuid::Uuid16(uuid) => uuid,
            Uuid::Uuid128(uuid) => uuid,
        }
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.len() {
            2 => Ok(Uuid::Uuid16([value[0], value[1]])),
            16 => {
                let mut bytes = [0; 16];
                bytes.copy_from_slice(value);
                Ok(Uuid::Uuid128(bytes))
            }
            _ => Err(Error::InvalidUuid),
        }
    }
}

/// Parses the textual form, either four hex digits (`"180f"`) or 32 hex digits with optional
/// dashes (`"19b10000-e8f2-537e-4f6c-d104768a1214"`). The text is big endian.
impl FromStr for Uuid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 16];
        let mut nibbles = 0;
        for c in s.chars().filter(|c| *c != '-') {
            let digit = c.to_digit(16).ok_or(Error::InvalidUuid)? as u8;
            if nibbles == 32 {
                return Err(Error::InvalidUuid);
            }
            let byte = &mut bytes[nibbles / 2];
            *byte = (*byte << 4) | digit;
            nibbles += 1;
        }

        match nibbles {
            4 => Ok(Uuid::Uuid16([bytes[1], bytes[0]])),
            32 => {
                bytes.reverse();
                Ok(Uuid::Uuid128(bytes))
            }
            _ => Err(Error::InvalidUuid),
        }
    }
}
