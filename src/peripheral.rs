//! Peripheral role controller.
//!
//! A [`Peripheral`] owns the attribute tables, the advertising content and the connected
//! [`Central`], and drives a [`Transceiver`]. Attributes and handlers are registered first;
//! [`Peripheral::begin`] finalizes the tables and hands them to the transceiver. From then on the
//! application calls [`Peripheral::poll`] regularly so transceiver events reach the handlers.
use embassy_time::Duration;

use crate::advertise::{AdvertisingData, AdvertisingLimits, AdvertisingSettings};
use crate::attribute::{
    CharacteristicProp, LocalAttribute, LocalHandle, RemoteAttribute, RemoteCharacteristic, RemoteHandle,
    RemoteService, Uuid, APPEARANCE_HANDLE, CHARACTERISTIC_SERVICES_CHANGED_UUID16, DEVICE_NAME_HANDLE,
    GENERIC_ATTRIBUTE_SERVICE_UUID16,
};
use crate::central::Central;
use crate::dispatch::PeripheralState;
use crate::event::{
    CharacteristicEventHandler, CharacteristicEventKind, DeviceEventHandler, DeviceEventKind,
    PeripheralEventHandler, PeripheralEventKind, RemoteCharacteristicEventHandler,
};
use crate::transceiver::Transceiver;
use crate::Error;

/// Peripheral role controller over a transceiver `T`.
///
/// Manufacturer data and the local name are borrowed for `'d`.
pub struct Peripheral<'d, T: Transceiver> {
    transceiver: T,
    state: PeripheralState,
    advertising: AdvertisingSettings<'d>,
    limits: AdvertisingLimits,
    finalized: bool,
}

impl<'d, T: Transceiver> Peripheral<'d, T> {
    /// Create a controller with only the generic access and generic attribute entries.
    pub fn new(transceiver: T) -> Self {
        Self {
            transceiver,
            state: PeripheralState::new(),
            advertising: AdvertisingSettings::default(),
            limits: AdvertisingLimits::default(),
            finalized: false,
        }
    }

    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }

    /// Add a service, characteristic or descriptor to the local table.
    ///
    /// Attributes are served in the order they are added, so a characteristic belongs to the
    /// service added before it.
    pub fn add_local_attribute<A: Into<LocalAttribute>>(&mut self, attribute: A) -> Result<LocalHandle, Error> {
        if self.finalized {
            warn!("[peripheral] local attribute added after begin");
            return Err(Error::UnsupportedOperation);
        }
        let attribute = attribute.into();
        debug!("[peripheral] add local {:?} {:?}", attribute.attribute_type(), attribute.uuid());
        self.state.local.push(attribute).map(LocalHandle)
    }

    /// Add a service or characteristic expected on the central.
    pub fn add_remote_attribute<A: Into<RemoteAttribute>>(&mut self, attribute: A) -> Result<RemoteHandle, Error> {
        if self.finalized {
            warn!("[peripheral] remote attribute added after begin");
            return Err(Error::UnsupportedOperation);
        }
        let attribute = attribute.into();
        debug!("[peripheral] add remote {:?} {:?}", attribute.attribute_type(), attribute.uuid());
        self.state.remote.push(attribute).map(RemoteHandle)
    }

    /// Register the handler for a connection lifecycle event.
    pub fn set_event_handler(&mut self, kind: PeripheralEventKind, handler: PeripheralEventHandler) {
        self.state.handlers.set(kind, handler);
    }

    /// Register the handler for a device event.
    pub fn set_device_event_handler(&mut self, kind: DeviceEventKind, handler: DeviceEventHandler) {
        self.state.device_handlers.set(kind, handler);
    }

    /// Register a handler on a local characteristic already in the table.
    pub fn set_characteristic_event_handler(
        &mut self,
        handle: LocalHandle,
        kind: CharacteristicEventKind,
        handler: CharacteristicEventHandler,
    ) -> Result<(), Error> {
        self.state.local_characteristic_mut(handle)?.set_event_handler(kind, handler);
        Ok(())
    }

    /// Register the value updated handler on a remote characteristic already in the table.
    pub fn set_remote_characteristic_event_handler(
        &mut self,
        handle: RemoteHandle,
        handler: RemoteCharacteristicEventHandler,
    ) -> Result<(), Error> {
        self.state.remote_characteristic_mut(handle)?.set_event_handler(handler);
        Ok(())
    }

    /// Set the generic access device name. Names longer than 19 bytes are truncated.
    pub fn set_device_name(&mut self, name: &str) -> Result<(), Error> {
        self.set_value(DEVICE_NAME_HANDLE, name.as_bytes())
    }

    /// Set the generic access appearance.
    pub fn set_appearance(&mut self, appearance: u16) -> Result<(), Error> {
        self.set_value(APPEARANCE_HANDLE, &appearance.to_le_bytes())
    }

    pub fn set_advertised_service_uuid<U: Into<Uuid>>(&mut self, uuid: U) {
        self.advertising.advertised_service_uuid = Some(uuid.into());
    }

    pub fn set_service_solicitation_uuid<U: Into<Uuid>>(&mut self, uuid: U) {
        self.advertising.service_solicitation_uuid = Some(uuid.into());
    }

    /// Manufacturer specific data, company identifier first. Truncated to what fits the packet.
    pub fn set_manufacturer_data(&mut self, data: &'d [u8]) {
        self.advertising.manufacturer_data = data;
    }

    /// Name carried in the scan response. Shortened to what fits the packet.
    pub fn set_local_name(&mut self, name: &'d str) {
        self.advertising.local_name = Some(name);
    }

    pub fn set_advertising_limits(&mut self, limits: AdvertisingLimits) {
        self.limits = limits;
    }

    /// Advertising records for the current settings.
    pub fn advertising_data(&self) -> AdvertisingData {
        self.advertising.build(&self.limits)
    }

    /// Finalize the attribute tables and start the transceiver.
    ///
    /// Characteristics are attached so value changes are pushed to the transceiver. If any remote
    /// attribute was added, the generic attribute service and services changed characteristic
    /// are mirrored at the end of the remote table. The local address is requested once started.
    pub fn begin(&mut self) -> Result<(), Error> {
        if !self.finalized {
            self.finalize()?;
        }

        let advertising = self.advertising_data();
        if advertising.truncated_manufacturer_data() || advertising.truncated_local_name() {
            info!(
                "[peripheral] advertising truncated, manufacturer data {}, local name {}",
                advertising.truncated_manufacturer_data(),
                advertising.truncated_local_name()
            );
        }

        info!(
            "[peripheral] begin with {} local and {} remote attributes",
            self.state.local.len(),
            self.state.remote.len()
        );
        self.transceiver
            .begin(&advertising, self.state.local.as_slice(), self.state.remote.as_slice());
        self.transceiver.request_address();
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), Error> {
        if !self.state.remote.is_empty() {
            if self.state.remote.len() + 2 > self.state.remote.capacity() {
                warn!("[peripheral] no space for the generic attribute mirror");
                return Err(Error::CapacityExceeded);
            }
            self.state.remote.push(RemoteService::new(GENERIC_ATTRIBUTE_SERVICE_UUID16).into())?;
            self.state.remote.push(
                RemoteCharacteristic::new(CHARACTERISTIC_SERVICES_CHANGED_UUID16, [CharacteristicProp::Indicate])
                    .into(),
            )?;
        }

        for characteristic in self
            .state
            .local
            .iter_mut()
            .filter_map(LocalAttribute::as_characteristic_mut)
        {
            characteristic.attach();
        }
        for characteristic in self
            .state
            .remote
            .iter_mut()
            .filter_map(RemoteAttribute::as_characteristic_mut)
        {
            characteristic.attach();
        }
        self.finalized = true;
        Ok(())
    }

    /// Deliver pending transceiver events to the registered handlers.
    pub fn poll(&mut self) {
        self.transceiver.poll(&mut self.state);
    }

    /// Stop the transceiver. The connected central, if any, is forgotten.
    ///
    /// Dropping the peripheral stops the transceiver as well.
    pub fn end(&mut self) {
        info!("[peripheral] end");
        self.transceiver.end();
        self.state.central.disconnect();
    }

    /// Rebuild the advertising data, push it to the transceiver and start advertising.
    pub fn start_advertising(&mut self) {
        let advertising = self.advertising_data();
        self.transceiver.update_advertising_data(&advertising);
        self.transceiver.start_advertising();
    }

    pub fn stop_advertising(&mut self) {
        self.transceiver.stop_advertising();
    }

    /// Start observing advertisements. They are delivered as [`DeviceEventKind::AdvertisementReceived`].
    pub fn start_scanning(&mut self) {
        self.transceiver.start_scanning();
    }

    pub fn stop_scanning(&mut self) {
        self.transceiver.stop_scanning();
    }

    pub fn set_advertising_interval(&mut self, interval: Duration) {
        self.transceiver.set_advertising_interval(interval);
    }

    pub fn set_connection_interval(&mut self, min: Duration, max: Duration) {
        self.transceiver.set_connection_interval(min, max);
    }

    pub fn set_connectable(&mut self, connectable: bool) {
        self.transceiver.set_connectable(connectable);
    }

    /// Set the transmit power in dBm.
    pub fn set_tx_power(&mut self, dbm: i8) -> Result<(), Error> {
        if self.transceiver.set_tx_power(dbm) {
            Ok(())
        } else {
            warn!("[peripheral] tx power {} declined", dbm);
            Err(Error::UnsupportedOperation)
        }
    }

    pub fn set_bond_store(&mut self, store: T::BondStore) {
        self.transceiver.set_bond_store(store);
    }

    /// Ask the transceiver to drop the connection. The central is cleared once the
    /// disconnection is reported.
    pub fn disconnect(&mut self) {
        self.transceiver.disconnect();
    }

    /// Poll once, then return the connected central.
    pub fn central(&mut self) -> Central {
        self.poll();
        self.state.central
    }

    /// Poll once, then report whether a central is connected.
    pub fn connected(&mut self) -> bool {
        self.poll();
        self.state.central.is_connected()
    }

    /// The central as of the last poll.
    pub fn current_central(&self) -> Central {
        self.state.central
    }

    pub fn local_attribute(&self, handle: LocalHandle) -> Option<&LocalAttribute> {
        self.state.local.get(handle.index())
    }

    pub fn remote_attribute(&self, handle: RemoteHandle) -> Option<&RemoteAttribute> {
        self.state.remote.get(handle.index())
    }

    /// Value of a local characteristic.
    pub fn value(&self, handle: LocalHandle) -> Result<&[u8], Error> {
        Ok(self.state.local_characteristic(handle)?.value())
    }

    /// Set the value of a local characteristic, truncated to its maximum length.
    ///
    /// Once the peripheral has begun the value is pushed to the transceiver, which notifies or
    /// indicates a subscribed central. The value is kept even if the push is declined.
    pub fn set_value(&mut self, handle: LocalHandle, value: &[u8]) -> Result<(), Error> {
        let characteristic = self.state.local_characteristic_mut(handle)?;
        characteristic.set_value(value);
        if characteristic.attached() && !self.transceiver.update_characteristic_value(handle, characteristic) {
            debug!("[peripheral] value update for {:?} declined", handle);
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Whether the central wrote the characteristic since the last call.
    pub fn take_written(&mut self, handle: LocalHandle) -> Result<bool, Error> {
        Ok(self.state.local_characteristic_mut(handle)?.take_written())
    }

    pub fn subscribed(&self, handle: LocalHandle) -> Result<bool, Error> {
        Ok(self.state.local_characteristic(handle)?.subscribed())
    }

    /// Put the value of a local characteristic into the advertising data.
    pub fn broadcast_characteristic(&mut self, handle: LocalHandle) -> Result<(), Error> {
        let characteristic = self.state.local_characteristic(handle)?;
        if !characteristic.attached() || !characteristic.props().any(&[CharacteristicProp::Broadcast]) {
            return Err(Error::UnsupportedOperation);
        }
        if self.transceiver.broadcast_characteristic(handle, characteristic) {
            Ok(())
        } else {
            warn!("[peripheral] broadcast of {:?} declined", handle);
            Err(Error::UnsupportedOperation)
        }
    }

    pub fn can_notify(&self, handle: LocalHandle) -> bool {
        self.state
            .local_characteristic(handle)
            .map(|c| c.attached() && self.transceiver.can_notify_characteristic(handle, c))
            .unwrap_or(false)
    }

    pub fn can_indicate(&self, handle: LocalHandle) -> bool {
        self.state
            .local_characteristic(handle)
            .map(|c| c.attached() && self.transceiver.can_indicate_characteristic(handle, c))
            .unwrap_or(false)
    }

    /// Last value received for a remote characteristic.
    pub fn remote_value(&self, handle: RemoteHandle) -> Result<&[u8], Error> {
        Ok(self.state.remote_characteristic(handle)?.value())
    }

    /// Whether a value arrived for the remote characteristic since the last call.
    pub fn take_value_updated(&mut self, handle: RemoteHandle) -> Result<bool, Error> {
        Ok(self.state.remote_characteristic_mut(handle)?.take_value_updated())
    }

    pub fn can_read_remote(&self, handle: RemoteHandle) -> bool {
        self.remote_check(handle, T::can_read_remote_characteristic)
    }

    /// Request a read. The value arrives as a remote value changed event.
    pub fn read_remote(&mut self, handle: RemoteHandle) -> Result<(), Error> {
        self.remote_request(handle, T::can_read_remote_characteristic, T::read_remote_characteristic)
    }

    pub fn can_write_remote(&self, handle: RemoteHandle) -> bool {
        self.remote_check(handle, T::can_write_remote_characteristic)
    }

    pub fn write_remote(&mut self, handle: RemoteHandle, value: &[u8]) -> Result<(), Error> {
        self.remote_request(handle, T::can_write_remote_characteristic, |t, h, c| {
            t.write_remote_characteristic(h, c, value)
        })
    }

    pub fn can_subscribe_remote(&self, handle: RemoteHandle) -> bool {
        self.remote_check(handle, T::can_subscribe_remote_characteristic)
    }

    pub fn subscribe_remote(&mut self, handle: RemoteHandle) -> Result<(), Error> {
        self.remote_request(
            handle,
            T::can_subscribe_remote_characteristic,
            T::subscribe_remote_characteristic,
        )
    }

    pub fn can_unsubscribe_remote(&self, handle: RemoteHandle) -> bool {
        self.remote_check(handle, T::can_unsubscribe_remote_characteristic)
    }

    pub fn unsubscribe_remote(&mut self, handle: RemoteHandle) -> Result<(), Error> {
        self.remote_request(
            handle,
            T::can_unsubscribe_remote_characteristic,
            T::unsubscribe_remote_characteristic,
        )
    }

    fn remote_check<P>(&self, handle: RemoteHandle, check: P) -> bool
    where
        P: FnOnce(&T, RemoteHandle, &RemoteCharacteristic) -> bool,
    {
        if !self.state.central.is_connected() {
            return false;
        }
        match self.state.remote_characteristic(handle) {
            Ok(c) => c.attached() && check(&self.transceiver, handle, c),
            Err(_) => false,
        }
    }

    fn remote_request<P, R>(&mut self, handle: RemoteHandle, check: P, request: R) -> Result<(), Error>
    where
        P: FnOnce(&T, RemoteHandle, &RemoteCharacteristic) -> bool,
        R: FnOnce(&mut T, RemoteHandle, &RemoteCharacteristic) -> bool,
    {
        if !self.state.central.is_connected() {
            return Err(Error::NotConnected);
        }
        let characteristic = self.state.remote_characteristic(handle)?;
        if !characteristic.attached() || !check(&self.transceiver, handle, characteristic) {
            return Err(Error::UnsupportedOperation);
        }
        if request(&mut self.transceiver, handle, characteristic) {
            Ok(())
        } else {
            debug!("[peripheral] request on {:?} declined", handle);
            Err(Error::Busy)
        }
    }
}

impl<'d, T: Transceiver> Drop for Peripheral<'d, T> {
    fn drop(&mut self) {
        self.transceiver.end();
    }
}
