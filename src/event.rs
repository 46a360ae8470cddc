//! Transceiver events and user handler tables.
//!
//! Events reach the peripheral in two families: role events about the connection lifecycle and
//! device events carrying radio level telemetry. Each family has its own handler table with at
//! most one handler per kind.
use core::marker::PhantomData;

use bt_hci::param::BdAddr;

use crate::attribute::{LocalCharacteristic, LocalHandle, RemoteCharacteristic, RemoteHandle};
use crate::central::Central;
use crate::Error;

/// Handler for connection lifecycle events.
pub type PeripheralEventHandler = fn(&Central);

/// Handler for radio level device events.
pub type DeviceEventHandler = fn(&DeviceEvent<'_>);

/// Handler for events on a local characteristic.
pub type CharacteristicEventHandler = fn(&Central, &LocalCharacteristic);

/// Handler for value updates of a remote characteristic.
pub type RemoteCharacteristicEventHandler = fn(&Central, &RemoteCharacteristic);

/// Something a handler table can be keyed by.
pub trait EventKind: Copy {
    /// Slot of this kind in its table.
    fn index(self) -> usize;
}

/// Connection lifecycle events.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PeripheralEventKind {
    Connected = 0,
    Disconnected = 1,
    Bonded = 2,
    RemoteServicesDiscovered = 3,
}

impl PeripheralEventKind {
    pub const COUNT: usize = 4;
}

impl EventKind for PeripheralEventKind {
    fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for PeripheralEventKind {
    type Error = Error;
    fn try_from(val: u8) -> Result<Self, Error> {
        Ok(match val {
            0 => Self::Connected,
            1 => Self::Disconnected,
            2 => Self::Bonded,
            3 => Self::RemoteServicesDiscovered,
            _ => return Err(Error::InvalidEventKind(val)),
        })
    }
}

/// Radio level events.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceEventKind {
    AddressReceived = 0,
    TemperatureReceived = 1,
    BatteryLevelReceived = 2,
    AdvertisementReceived = 3,
}

impl DeviceEventKind {
    pub const COUNT: usize = 4;
}

impl EventKind for DeviceEventKind {
    fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for DeviceEventKind {
    type Error = Error;
    fn try_from(val: u8) -> Result<Self, Error> {
        Ok(match val {
            0 => Self::AddressReceived,
            1 => Self::TemperatureReceived,
            2 => Self::BatteryLevelReceived,
            3 => Self::AdvertisementReceived,
            _ => return Err(Error::InvalidEventKind(val)),
        })
    }
}

/// Local characteristic events.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharacteristicEventKind {
    /// The central wrote a new value.
    Written = 0,
    /// The central enabled notifications or indications.
    Subscribed = 1,
    /// The central disabled notifications and indications.
    Unsubscribed = 2,
}

impl CharacteristicEventKind {
    pub const COUNT: usize = 3;
}

impl EventKind for CharacteristicEventKind {
    fn index(self) -> usize {
        self as usize
    }
}

/// Radio level event payload.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent<'a> {
    /// The local device address.
    AddressReceived(BdAddr),
    /// Die temperature in degrees Celsius.
    TemperatureReceived(f32),
    /// Battery level in volts.
    BatteryLevelReceived(f32),
    /// Raw advertising payload seen while scanning. See [`crate::ad_structure::AdStructure::decode`].
    AdvertisementReceived(&'a [u8]),
}

impl<'a> DeviceEvent<'a> {
    pub fn kind(&self) -> DeviceEventKind {
        match self {
            DeviceEvent::AddressReceived(_) => DeviceEventKind::AddressReceived,
            DeviceEvent::TemperatureReceived(_) => DeviceEventKind::TemperatureReceived,
            DeviceEvent::BatteryLevelReceived(_) => DeviceEventKind::BatteryLevelReceived,
            DeviceEvent::AdvertisementReceived(_) => DeviceEventKind::AdvertisementReceived,
        }
    }
}

/// An event delivered by the transceiver during `poll`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransceiverEvent<'a> {
    Connected(BdAddr),
    Disconnected,
    Bonded,
    RemoteServicesDiscovered,
    CharacteristicValueChanged { handle: LocalHandle, value: &'a [u8] },
    CharacteristicSubscriptionChanged { handle: LocalHandle, subscribed: bool },
    RemoteCharacteristicValueChanged { handle: RemoteHandle, value: &'a [u8] },
    Device(DeviceEvent<'a>),
}

/// Receiver of transceiver events.
pub trait EventListener {
    fn on_event(&mut self, event: TransceiverEvent<'_>);
}

/// Fixed size table mapping each event kind to at most one handler.
#[derive(Clone)]
pub struct HandlerTable<K, H, const N: usize> {
    slots: [Option<H>; N],
    _kind: PhantomData<K>,
}

impl<K: EventKind, H: Copy, const N: usize> Default for HandlerTable<K, H, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EventKind, H: Copy, const N: usize> HandlerTable<K, H, N> {
    pub fn new() -> Self {
        Self {
            slots: [None; N],
            _kind: PhantomData,
        }
    }

    /// Register `handler` for `kind`, replacing the previous one.
    ///
    /// Kinds past the end of the table are ignored.
    pub fn set(&mut self, kind: K, handler: H) {
        match self.slots.get_mut(kind.index()) {
            Some(slot) => *slot = Some(handler),
            None => warn!("[event] no handler slot {}", kind.index()),
        }
    }

    /// Remove the handler for `kind`.
    pub fn clear(&mut self, kind: K) {
        if let Some(slot) = self.slots.get_mut(kind.index()) {
            *slot = None;
        }
    }

    pub fn get(&self, kind: K) -> Option<H> {
        self.slots.get(kind.index()).copied().flatten()
    }
}

impl<K, H, const N: usize> core::fmt::Debug for HandlerTable<K, H, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.slots.iter().map(|s| s.is_some())).finish()
    }
}
