//! Local and remote attribute tables.
//!
//! The local table holds what this device serves: services, characteristics and descriptors.
//! The remote table mirrors attributes expected on the connected central. Both are fixed
//! capacity; an attribute's handle is its index and never changes.
use heapless::Vec;

use crate::config::ATTRIBUTE_VALUE_MAX;
pub use crate::types::uuid::Uuid;

mod local;
mod remote;
mod table;

pub use local::{LocalAttribute, LocalCharacteristic, LocalDescriptor, LocalService};
pub use remote::{RemoteAttribute, RemoteCharacteristic, RemoteService};
pub use table::AttributeTable;

/// UUID for generic access service
pub const GENERIC_ACCESS_SERVICE_UUID16: Uuid = Uuid::new_short(0x1800);

/// UUID for device name characteristic
pub const CHARACTERISTIC_DEVICE_NAME_UUID16: Uuid = Uuid::new_short(0x2A00);

/// UUID for appearance characteristic
pub const CHARACTERISTIC_APPEARANCE_UUID16: Uuid = Uuid::new_short(0x2A01);

/// UUID for generic attribute service
pub const GENERIC_ATTRIBUTE_SERVICE_UUID16: Uuid = Uuid::new_short(0x1801);

/// UUID for services changed characteristic
pub const CHARACTERISTIC_SERVICES_CHANGED_UUID16: Uuid = Uuid::new_short(0x2A05);

/// Longest device name the generic access service exposes.
pub const DEVICE_NAME_MAX: usize = 19;

/// Device name until the application sets one.
pub const DEFAULT_DEVICE_NAME: &str = "Peripheral";

/// Appearance until the application sets one (unknown).
pub const DEFAULT_APPEARANCE: u16 = 0;

/// Handle of the device name characteristic.
pub const DEVICE_NAME_HANDLE: LocalHandle = LocalHandle(1);

/// Handle of the appearance characteristic.
pub const APPEARANCE_HANDLE: LocalHandle = LocalHandle(2);

/// Handle of the services changed characteristic.
pub const SERVICES_CHANGED_HANDLE: LocalHandle = LocalHandle(4);

/// Number of entries every local table starts with.
pub const SYSTEM_ATTRIBUTES: usize = 5;

/// Attribute value storage.
pub type Value = Vec<u8, ATTRIBUTE_VALUE_MAX>;

/// Characteristic properties
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharacteristicProp {
    /// Broadcast
    Broadcast = 0x01,
    /// Read
    Read = 0x02,
    /// Write without response
    WriteWithoutResponse = 0x04,
    /// Write
    Write = 0x08,
    /// Notify
    Notify = 0x10,
    /// Indicate
    Indicate = 0x20,
}

/// Properties of a characteristic.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacteristicProps(u8);

impl From<&[CharacteristicProp]> for CharacteristicProps {
    fn from(props: &[CharacteristicProp]) -> Self {
        Self(props.iter().fold(0, |bits, prop| bits | *prop as u8))
    }
}

impl<const N: usize> From<[CharacteristicProp; N]> for CharacteristicProps {
    fn from(props: [CharacteristicProp; N]) -> Self {
        Self::from(&props[..])
    }
}

impl From<CharacteristicProp> for CharacteristicProps {
    fn from(prop: CharacteristicProp) -> Self {
        Self(prop as u8)
    }
}

impl CharacteristicProps {
    /// Whether at least one of `props` is set.
    pub fn any(&self, props: &[CharacteristicProp]) -> bool {
        self.0 & Self::from(props).0 != 0
    }

    /// Raw bit field as used in the characteristic declaration.
    pub fn raw(&self) -> u8 {
        self.0
    }
}

/// Kind of attribute.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Service,
    Characteristic,
    Descriptor,
}

/// Handle to an attribute in the local table.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalHandle(pub(crate) u16);

impl LocalHandle {
    /// Position in the local table.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for LocalHandle {
    fn from(handle: u16) -> Self {
        Self(handle)
    }
}

/// Handle to an attribute in the remote table.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteHandle(pub(crate) u16);

impl RemoteHandle {
    /// Position in the remote table.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for RemoteHandle {
    fn from(handle: u16) -> Self {
        Self(handle)
    }
}

/// Copy `src` into `value`, keeping at most `max_len` bytes. Returns the stored length.
pub(crate) fn store_value(value: &mut Value, max_len: usize, src: &[u8]) -> usize {
    let len = src.len().min(max_len).min(value.capacity());
    value.clear();
    // Length bounded by capacity above.
    let _ = value.extend_from_slice(&src[..len]);
    if len < src.len() {
        debug!("[attribute] value truncated from {} to {} bytes", src.len(), len);
    }
    len
}
