//! In-memory transceiver for host side testing.
//!
//! [`MockTransceiver`] records every request made by a [`crate::peripheral::Peripheral`] and
//! replays queued [`MockEvent`]s on the next poll. Checks and requests are accepted or declined
//! as a whole through [`MockTransceiver::accept_checks`] and [`MockTransceiver::accept_requests`].
use bt_hci::param::BdAddr;
use embassy_time::Duration;
use heapless::{Deque, Vec};

use crate::advertise::AdvertisingData;
use crate::attribute::{
    CharacteristicProp, CharacteristicProps, LocalAttribute, LocalCharacteristic, LocalHandle, RemoteAttribute,
    RemoteCharacteristic, RemoteHandle, Uuid, Value,
};
use crate::config::REMOTE_ATTRIBUTES_MAX;
use crate::event::{DeviceEvent, EventListener, TransceiverEvent};
use crate::transceiver::{BondStore, Transceiver};

/// Events held by the mock until polled.
pub const MOCK_EVENTS_MAX: usize = 16;

/// Requests of each kind recorded by the mock.
pub const MOCK_RECORDS_MAX: usize = 8;

/// Longest advertisement a mock event can carry.
pub const MOCK_ADVERTISEMENT_MAX: usize = 31;

/// Owned counterpart of [`TransceiverEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Connected(BdAddr),
    Disconnected,
    Bonded,
    RemoteServicesDiscovered,
    CharacteristicValueChanged { handle: LocalHandle, value: Value },
    CharacteristicSubscriptionChanged { handle: LocalHandle, subscribed: bool },
    RemoteCharacteristicValueChanged { handle: RemoteHandle, value: Value },
    AddressReceived(BdAddr),
    TemperatureReceived(f32),
    BatteryLevelReceived(f32),
    AdvertisementReceived(Vec<u8, MOCK_ADVERTISEMENT_MAX>),
}

impl MockEvent {
    /// The central wrote `value` to a local characteristic.
    pub fn written(handle: LocalHandle, value: &[u8]) -> Self {
        Self::CharacteristicValueChanged {
            handle,
            value: truncated(value),
        }
    }

    /// A read completed or a notification arrived for a remote characteristic.
    pub fn remote_value(handle: RemoteHandle, value: &[u8]) -> Self {
        Self::RemoteCharacteristicValueChanged {
            handle,
            value: truncated(value),
        }
    }

    /// An advertisement was observed while scanning.
    pub fn advertisement(data: &[u8]) -> Self {
        Self::AdvertisementReceived(truncated(data))
    }

    pub fn as_event(&self) -> TransceiverEvent<'_> {
        match self {
            MockEvent::Connected(address) => TransceiverEvent::Connected(*address),
            MockEvent::Disconnected => TransceiverEvent::Disconnected,
            MockEvent::Bonded => TransceiverEvent::Bonded,
            MockEvent::RemoteServicesDiscovered => TransceiverEvent::RemoteServicesDiscovered,
            MockEvent::CharacteristicValueChanged { handle, value } => TransceiverEvent::CharacteristicValueChanged {
                handle: *handle,
                value,
            },
            MockEvent::CharacteristicSubscriptionChanged { handle, subscribed } => {
                TransceiverEvent::CharacteristicSubscriptionChanged {
                    handle: *handle,
                    subscribed: *subscribed,
                }
            }
            MockEvent::RemoteCharacteristicValueChanged { handle, value } => {
                TransceiverEvent::RemoteCharacteristicValueChanged {
                    handle: *handle,
                    value,
                }
            }
            MockEvent::AddressReceived(address) => TransceiverEvent::Device(DeviceEvent::AddressReceived(*address)),
            MockEvent::TemperatureReceived(celsius) => {
                TransceiverEvent::Device(DeviceEvent::TemperatureReceived(*celsius))
            }
            MockEvent::BatteryLevelReceived(volts) => {
                TransceiverEvent::Device(DeviceEvent::BatteryLevelReceived(*volts))
            }
            MockEvent::AdvertisementReceived(data) => {
                TransceiverEvent::Device(DeviceEvent::AdvertisementReceived(data))
            }
        }
    }
}

fn truncated<const N: usize>(src: &[u8]) -> Vec<u8, N> {
    let len = src.len().min(N);
    let mut out = Vec::new();
    // Length bounded by capacity above.
    let _ = out.extend_from_slice(&src[..len]);
    out
}

/// Bond storage kept in RAM.
#[derive(Debug, Clone, Default)]
pub struct MemoryBondStore<const N: usize = 64> {
    data: Vec<u8, N>,
}

impl<const N: usize> MemoryBondStore<N> {
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }
}

impl<const N: usize> BondStore for MemoryBondStore<N> {
    fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    fn clear_data(&mut self) {
        self.data.clear();
    }

    fn put_data(&mut self, offset: usize, data: &[u8]) -> bool {
        let end = offset + data.len();
        if end > N {
            return false;
        }
        if end > self.data.len() && self.data.resize(end, 0).is_err() {
            return false;
        }
        self.data[offset..end].copy_from_slice(data);
        true
    }

    fn get_data(&self, offset: usize, buf: &mut [u8]) -> bool {
        let end = offset + buf.len();
        if end > self.data.len() {
            return false;
        }
        buf.copy_from_slice(&self.data[offset..end]);
        true
    }
}

/// Transceiver that records requests and replays queued events.
#[derive(Debug, Default)]
pub struct MockTransceiver {
    events: Deque<MockEvent, MOCK_EVENTS_MAX>,
    /// Answer feasibility checks positively when the characteristic has the matching property.
    pub accept_checks: bool,
    /// Accept mutating requests.
    pub accept_requests: bool,
    pub began: bool,
    pub advertising: bool,
    pub scanning: bool,
    pub connectable: bool,
    pub advertising_data: Option<AdvertisingData>,
    pub local_attributes: usize,
    pub remote_uuids: Vec<Uuid, REMOTE_ATTRIBUTES_MAX>,
    pub polls: usize,
    pub address_requests: usize,
    pub disconnects: usize,
    pub advertising_interval: Option<Duration>,
    pub connection_interval: Option<(Duration, Duration)>,
    pub tx_power: Option<i8>,
    pub bond_store: Option<MemoryBondStore>,
    pub value_updates: Vec<(LocalHandle, Value), MOCK_RECORDS_MAX>,
    pub broadcasts: Vec<LocalHandle, MOCK_RECORDS_MAX>,
    pub remote_reads: Vec<RemoteHandle, MOCK_RECORDS_MAX>,
    pub remote_writes: Vec<(RemoteHandle, Value), MOCK_RECORDS_MAX>,
    pub remote_subscriptions: Vec<(RemoteHandle, bool), MOCK_RECORDS_MAX>,
}

impl MockTransceiver {
    /// A mock that accepts every check and request.
    pub fn new() -> Self {
        Self {
            accept_checks: true,
            accept_requests: true,
            ..Default::default()
        }
    }

    /// Queue an event for the next poll. Returns false if the queue is full.
    pub fn enqueue(&mut self, event: MockEvent) -> bool {
        self.events.push_back(event).is_ok()
    }

    /// Events not yet polled.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    fn check(&self, props: CharacteristicProps, wanted: &[CharacteristicProp]) -> bool {
        self.accept_checks && props.any(wanted)
    }
}

impl Transceiver for MockTransceiver {
    type BondStore = MemoryBondStore;

    fn begin(&mut self, advertising: &AdvertisingData, local: &[LocalAttribute], remote: &[RemoteAttribute]) {
        self.began = true;
        self.advertising_data = Some(advertising.clone());
        self.local_attributes = local.len();
        self.remote_uuids = remote.iter().map(|a| *a.uuid()).collect();
    }

    fn end(&mut self) {
        self.began = false;
        self.advertising = false;
        self.scanning = false;
        self.events.clear();
    }

    fn poll<L: EventListener>(&mut self, listener: &mut L) {
        self.polls += 1;
        while let Some(event) = self.events.pop_front() {
            listener.on_event(event.as_event());
        }
    }

    fn update_advertising_data(&mut self, advertising: &AdvertisingData) {
        self.advertising_data = Some(advertising.clone());
    }

    fn start_advertising(&mut self) {
        self.advertising = true;
    }

    fn stop_advertising(&mut self) {
        self.advertising = false;
    }

    fn set_advertising_interval(&mut self, interval: Duration) {
        self.advertising_interval = Some(interval);
    }

    fn set_connectable(&mut self, connectable: bool) {
        self.connectable = connectable;
    }

    fn set_connection_interval(&mut self, min: Duration, max: Duration) {
        self.connection_interval = Some((min, max));
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn request_address(&mut self) {
        self.address_requests += 1;
    }

    fn set_bond_store(&mut self, store: Self::BondStore) {
        self.bond_store = Some(store);
    }

    fn update_characteristic_value(&mut self, handle: LocalHandle, characteristic: &LocalCharacteristic) -> bool {
        self.accept_requests && self.value_updates.push((handle, truncated(characteristic.value()))).is_ok()
    }

    fn can_notify_characteristic(&self, _handle: LocalHandle, characteristic: &LocalCharacteristic) -> bool {
        self.check(characteristic.props(), &[CharacteristicProp::Notify])
    }

    fn can_indicate_characteristic(&self, _handle: LocalHandle, characteristic: &LocalCharacteristic) -> bool {
        self.check(characteristic.props(), &[CharacteristicProp::Indicate])
    }

    fn start_scanning(&mut self) {
        self.scanning = true;
    }

    fn stop_scanning(&mut self) {
        self.scanning = false;
    }

    fn set_tx_power(&mut self, dbm: i8) -> bool {
        if self.accept_requests {
            self.tx_power = Some(dbm);
        }
        self.accept_requests
    }

    fn broadcast_characteristic(&mut self, handle: LocalHandle, _characteristic: &LocalCharacteristic) -> bool {
        self.accept_requests && self.broadcasts.push(handle).is_ok()
    }

    fn can_read_remote_characteristic(&self, _handle: RemoteHandle, characteristic: &RemoteCharacteristic) -> bool {
        self.check(characteristic.props(), &[CharacteristicProp::Read])
    }

    fn read_remote_characteristic(&mut self, handle: RemoteHandle, _characteristic: &RemoteCharacteristic) -> bool {
        self.accept_requests && self.remote_reads.push(handle).is_ok()
    }

    fn can_write_remote_characteristic(&self, _handle: RemoteHandle, characteristic: &RemoteCharacteristic) -> bool {
        self.check(
            characteristic.props(),
            &[CharacteristicProp::Write, CharacteristicProp::WriteWithoutResponse],
        )
    }

    fn write_remote_characteristic(
        &mut self,
        handle: RemoteHandle,
        _characteristic: &RemoteCharacteristic,
        value: &[u8],
    ) -> bool {
        self.accept_requests && self.remote_writes.push((handle, truncated(value))).is_ok()
    }

    fn can_subscribe_remote_characteristic(
        &self,
        _handle: RemoteHandle,
        characteristic: &RemoteCharacteristic,
    ) -> bool {
        self.check(
            characteristic.props(),
            &[CharacteristicProp::Notify, CharacteristicProp::Indicate],
        )
    }

    fn subscribe_remote_characteristic(
        &mut self,
        handle: RemoteHandle,
        _characteristic: &RemoteCharacteristic,
    ) -> bool {
        self.accept_requests && self.remote_subscriptions.push((handle, true)).is_ok()
    }

    fn can_unsubscribe_remote_characteristic(
        &self,
        _handle: RemoteHandle,
        characteristic: &RemoteCharacteristic,
    ) -> bool {
        self.check(
            characteristic.props(),
            &[CharacteristicProp::Notify, CharacteristicProp::Indicate],
        )
    }

    fn unsubscribe_remote_characteristic(
        &mut self,
        handle: RemoteHandle,
        _characteristic: &RemoteCharacteristic,
    ) -> bool {
        self.accept_requests && self.remote_subscriptions.push((handle, false)).is_ok()
    }
}
