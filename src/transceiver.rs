//! Capability set expected from the radio.
//!
//! A transceiver runs the link layer and GATT protocol on dedicated hardware or firmware. The
//! peripheral hands it attribute tables and advertising data, issues requests, and receives
//! events through [`Transceiver::poll`].
//!
//! Requests answer whether they were accepted, not whether they completed. Optional capabilities
//! have default implementations that decline, so a backend only needs the core set.
use embassy_time::Duration;

use crate::advertise::AdvertisingData;
use crate::attribute::{
    LocalAttribute, LocalCharacteristic, LocalHandle, RemoteAttribute, RemoteCharacteristic, RemoteHandle,
};
use crate::event::EventListener;

/// Persistent storage for bonding keys, owned by the transceiver.
pub trait BondStore {
    /// Whether a bond has been stored.
    fn has_data(&self) -> bool;

    /// Forget the stored bond.
    fn clear_data(&mut self);

    /// Store `data` at `offset`. Returns false if it does not fit.
    fn put_data(&mut self, offset: usize, data: &[u8]) -> bool;

    /// Fill `buf` from `offset`. Returns false if the range is not stored.
    fn get_data(&self, offset: usize, buf: &mut [u8]) -> bool;
}

/// Radio backend driven by a [`crate::peripheral::Peripheral`].
pub trait Transceiver {
    /// Bond storage this backend persists keys to.
    type BondStore: BondStore;

    /// Start the radio with the finalized attribute tables.
    fn begin(&mut self, advertising: &AdvertisingData, local: &[LocalAttribute], remote: &[RemoteAttribute]);

    /// Stop the radio.
    fn end(&mut self);

    /// Deliver pending events to `listener`. Must not block indefinitely.
    fn poll<L: EventListener>(&mut self, listener: &mut L);

    fn update_advertising_data(&mut self, advertising: &AdvertisingData);

    fn start_advertising(&mut self);

    fn stop_advertising(&mut self);

    fn set_advertising_interval(&mut self, interval: Duration);

    fn set_connectable(&mut self, connectable: bool);

    fn set_connection_interval(&mut self, min: Duration, max: Duration);

    /// Drop the connection to the central.
    fn disconnect(&mut self);

    /// Ask for the local address, answered with an address received event.
    fn request_address(&mut self);

    fn set_bond_store(&mut self, store: Self::BondStore);

    /// Push the value of a local characteristic, notifying or indicating when subscribed.
    fn update_characteristic_value(&mut self, handle: LocalHandle, characteristic: &LocalCharacteristic) -> bool;

    fn can_notify_characteristic(&self, handle: LocalHandle, characteristic: &LocalCharacteristic) -> bool;

    fn can_indicate_characteristic(&self, handle: LocalHandle, characteristic: &LocalCharacteristic) -> bool;

    fn start_scanning(&mut self) {}

    fn stop_scanning(&mut self) {}

    /// Set the transmit power in dBm. Returns false if the level is not supported.
    fn set_tx_power(&mut self, dbm: i8) -> bool {
        let _ = dbm;
        false
    }

    /// Put the value of a local characteristic into the advertising data.
    fn broadcast_characteristic(&mut self, handle: LocalHandle, characteristic: &LocalCharacteristic) -> bool {
        let _ = (handle, characteristic);
        false
    }

    fn can_read_remote_characteristic(&self, handle: RemoteHandle, characteristic: &RemoteCharacteristic) -> bool {
        let _ = (handle, characteristic);
        false
    }

    fn read_remote_characteristic(&mut self, handle: RemoteHandle, characteristic: &RemoteCharacteristic) -> bool {
        let _ = (handle, characteristic);
        false
    }

    fn can_write_remote_characteristic(&self, handle: RemoteHandle, characteristic: &RemoteCharacteristic) -> bool {
        let _ = (handle, characteristic);
        false
    }

    fn write_remote_characteristic(
        &mut self,
        handle: RemoteHandle,
        characteristic: &RemoteCharacteristic,
        value: &[u8],
    ) -> bool {
        let _ = (handle, characteristic, value);
        false
    }

    fn can_subscribe_remote_characteristic(&self, handle: RemoteHandle, characteristic: &RemoteCharacteristic) -> bool {
        let _ = (handle, characteristic);
        false
    }

    fn subscribe_remote_characteristic(&mut self, handle: RemoteHandle, characteristic: &RemoteCharacteristic) -> bool {
        let _ = (handle, characteristic);
        false
    }

    fn can_unsubscribe_remote_characteristic(
        &self,
        handle: RemoteHandle,
        characteristic: &RemoteCharacteristic,
    ) -> bool {
        let _ = (handle, characteristic);
        false
    }

    fn unsubscribe_remote_characteristic(
        &mut self,
        handle: RemoteHandle,
        characteristic: &RemoteCharacteristic,
    ) -> bool {
        let _ = (handle, characteristic);
        false
    }
}
