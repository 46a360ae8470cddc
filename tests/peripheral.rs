use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use embassy_time::Duration;
use peripheral_observer::ad_structure::{ad_type, AdStructure};
use peripheral_observer::advertise::{AdvertisingData, AdvertisingLimits};
use peripheral_observer::attribute::{
    CharacteristicProp, LocalAttribute, LocalCharacteristic, LocalDescriptor, LocalHandle, LocalService,
    RemoteAttribute, RemoteCharacteristic, RemoteService, APPEARANCE_HANDLE, CHARACTERISTIC_SERVICES_CHANGED_UUID16,
    DEVICE_NAME_HANDLE, GENERIC_ATTRIBUTE_SERVICE_UUID16,
};
use peripheral_observer::event::{
    CharacteristicEventKind, DeviceEvent, DeviceEventKind, EventListener, PeripheralEventKind,
};
use peripheral_observer::mock::{MemoryBondStore, MockEvent, MockTransceiver};
use peripheral_observer::transceiver::{BondStore, Transceiver};
use peripheral_observer::{BdAddr, Error, Peripheral, Uuid};

const ADDR_1: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
const ADDR_2: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];

const BATTERY_SERVICE: u16 = 0x180f;
const BATTERY_LEVEL: u16 = 0x2a19;

fn battery_peripheral(peripheral: &mut Peripheral<'_, MockTransceiver>) -> LocalHandle {
    unwrap_ok(peripheral.add_local_attribute(LocalService::new(BATTERY_SERVICE)));
    let handle = unwrap_ok(peripheral.add_local_attribute(LocalCharacteristic::new(
        BATTERY_LEVEL,
        [CharacteristicProp::Read, CharacteristicProp::Notify, CharacteristicProp::Write],
        1,
    )));
    unwrap_ok(peripheral.add_local_attribute(LocalDescriptor::new(0x2901u16, b"level")));
    handle
}

fn unwrap_ok<T>(result: Result<T, Error>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn connection_lifecycle() {
    let _ = env_logger::try_init();
    static CONNECTED: Mutex<Option<BdAddr>> = Mutex::new(None);
    static DISCONNECTED: Mutex<Option<BdAddr>> = Mutex::new(None);

    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.set_event_handler(PeripheralEventKind::Connected, |central| {
        *CONNECTED.lock().unwrap() = central.address();
    });
    peripheral.set_event_handler(PeripheralEventKind::Disconnected, |central| {
        *DISCONNECTED.lock().unwrap() = central.address();
    });
    peripheral.begin().unwrap();

    assert!(!peripheral.connected());
    peripheral.transceiver_mut().enqueue(MockEvent::Connected(BdAddr::new(ADDR_1)));
    assert!(peripheral.connected());
    assert_eq!(peripheral.current_central().address(), Some(BdAddr::new(ADDR_1)));
    assert_eq!(*CONNECTED.lock().unwrap(), Some(BdAddr::new(ADDR_1)));

    peripheral.transceiver_mut().enqueue(MockEvent::Disconnected);
    let central = peripheral.central();
    assert!(!central.is_connected());
    assert_eq!(central.address(), None);
    assert_eq!(*DISCONNECTED.lock().unwrap(), Some(BdAddr::new(ADDR_1)));

    peripheral.transceiver_mut().enqueue(MockEvent::Connected(BdAddr::new(ADDR_2)));
    assert_eq!(peripheral.central().address(), Some(BdAddr::new(ADDR_2)));
}

#[test]
fn bonded_and_remote_services_discovered_fire_once() {
    static BONDED: AtomicUsize = AtomicUsize::new(0);
    static DISCOVERED: AtomicUsize = AtomicUsize::new(0);

    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.set_event_handler(PeripheralEventKind::Bonded, |_| {
        BONDED.fetch_add(1, Ordering::Relaxed);
    });
    peripheral.set_event_handler(PeripheralEventKind::RemoteServicesDiscovered, |_| {
        DISCOVERED.fetch_add(1, Ordering::Relaxed);
    });
    peripheral.begin().unwrap();

    peripheral.transceiver_mut().enqueue(MockEvent::Connected(BdAddr::new(ADDR_1)));
    peripheral.transceiver_mut().enqueue(MockEvent::Bonded);
    peripheral.transceiver_mut().enqueue(MockEvent::RemoteServicesDiscovered);
    peripheral.poll();
    peripheral.poll();

    assert_eq!(BONDED.load(Ordering::Relaxed), 1);
    assert_eq!(DISCOVERED.load(Ordering::Relaxed), 1);
}

#[test]
fn queries_poll_but_current_central_does_not() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.transceiver_mut().enqueue(MockEvent::Connected(BdAddr::new(ADDR_1)));

    assert!(!peripheral.current_central().is_connected());
    assert_eq!(peripheral.transceiver().polls, 0);

    assert!(peripheral.connected());
    assert_eq!(peripheral.transceiver().polls, 1);
    let _ = peripheral.central();
    assert_eq!(peripheral.transceiver().polls, 2);
}

#[test]
fn begin_hands_tables_to_transceiver() {
    let _ = env_logger::try_init();
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    battery_peripheral(&mut peripheral);
    peripheral.set_advertised_service_uuid(BATTERY_SERVICE);
    peripheral.set_local_name("Battery");

    peripheral.begin().unwrap();

    let mock = peripheral.transceiver();
    assert!(mock.began);
    assert_eq!(mock.local_attributes, 8);
    assert!(mock.remote_uuids.is_empty());
    assert_eq!(mock.address_requests, 1);

    let data = mock.advertising_data.as_ref().unwrap();
    assert_eq!(data.records().len(), 1);
    assert_eq!(data.records()[0].ty(), ad_type::INCOMPLETE_SERVICE_UUIDS_16);
    assert_eq!(data.records()[0].data(), &[0x0f, 0x18]);
    assert_eq!(data.scan_response().map(|r| r.data()), Some(&b"Battery"[..]));
    assert_eq!(data, &peripheral.advertising_data());
}

#[test]
fn remote_attributes_get_generic_attribute_mirror() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    unwrap_ok(peripheral.add_remote_attribute(RemoteService::new(BATTERY_SERVICE)));
    unwrap_ok(peripheral.add_remote_attribute(RemoteCharacteristic::new(BATTERY_LEVEL, [CharacteristicProp::Read])));

    peripheral.begin().unwrap();

    let uuids = &peripheral.transceiver().remote_uuids;
    assert_eq!(uuids.len(), 4);
    assert_eq!(uuids[2], GENERIC_ATTRIBUTE_SERVICE_UUID16);
    assert_eq!(uuids[3], CHARACTERISTIC_SERVICES_CHANGED_UUID16);
}

#[test]
fn tables_are_closed_after_begin() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.begin().unwrap();
    assert_eq!(
        peripheral.add_local_attribute(LocalService::new(BATTERY_SERVICE)).err(),
        Some(Error::UnsupportedOperation)
    );
    assert_eq!(
        peripheral.add_remote_attribute(RemoteService::new(BATTERY_SERVICE)).err(),
        Some(Error::UnsupportedOperation)
    );

    peripheral.end();
    peripheral.begin().unwrap();
    assert!(peripheral.transceiver().remote_uuids.is_empty());
    assert_eq!(peripheral.transceiver().address_requests, 2);
}

#[test]
fn local_table_capacity() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    let free = peripheral_observer::config::LOCAL_ATTRIBUTES_MAX - 5;
    for _ in 0..free {
        unwrap_ok(peripheral.add_local_attribute(LocalService::new(BATTERY_SERVICE)));
    }
    assert_eq!(
        peripheral.add_local_attribute(LocalService::new(BATTERY_SERVICE)).err(),
        Some(Error::CapacityExceeded)
    );
}

#[test]
fn remote_table_capacity() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    for _ in 0..peripheral_observer::config::REMOTE_ATTRIBUTES_MAX {
        unwrap_ok(peripheral.add_remote_attribute(RemoteService::new(BATTERY_SERVICE)));
    }
    assert_eq!(
        peripheral.add_remote_attribute(RemoteService::new(BATTERY_SERVICE)).err(),
        Some(Error::CapacityExceeded)
    );
}

#[test]
fn begin_fails_without_room_for_mirror() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    for _ in 0..peripheral_observer::config::REMOTE_ATTRIBUTES_MAX - 1 {
        unwrap_ok(peripheral.add_remote_attribute(RemoteService::new(BATTERY_SERVICE)));
    }
    assert_eq!(peripheral.begin(), Err(Error::CapacityExceeded));
    assert!(!peripheral.transceiver().began);
    assert_eq!(peripheral.transceiver().address_requests, 0);
}

#[test]
fn value_round_trip_and_push() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    let level = battery_peripheral(&mut peripheral);

    // Not attached before begin, so nothing is pushed.
    peripheral.set_value(level, &[80]).unwrap();
    assert_eq!(peripheral.value(level).unwrap(), &[80]);
    assert!(peripheral.transceiver().value_updates.is_empty());

    peripheral.begin().unwrap();
    peripheral.set_value(level, &[75, 1, 2]).unwrap();
    assert_eq!(peripheral.value(level).unwrap(), &[75]);
    let updates = &peripheral.transceiver().value_updates;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, level);
    assert_eq!(&updates[0].1[..], &[75]);

    peripheral.transceiver_mut().accept_requests = false;
    assert_eq!(peripheral.set_value(level, &[70]), Err(Error::Busy));
    assert_eq!(peripheral.value(level).unwrap(), &[70]);

    assert_eq!(peripheral.value(LocalHandle::from(0)), Err(Error::NotFound));
    assert_eq!(peripheral.set_value(LocalHandle::from(200), &[1]), Err(Error::NotFound));
}

#[test]
fn device_name_and_appearance() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    assert_eq!(peripheral.value(DEVICE_NAME_HANDLE).unwrap(), b"Peripheral");
    assert_eq!(peripheral.value(APPEARANCE_HANDLE).unwrap(), &[0, 0]);

    peripheral.set_device_name("A rather long device name").unwrap();
    peripheral.set_appearance(0x03c1).unwrap();
    assert_eq!(peripheral.value(DEVICE_NAME_HANDLE).unwrap(), b"A rather long devic");
    assert_eq!(peripheral.value(APPEARANCE_HANDLE).unwrap(), &[0xc1, 0x03]);
}

#[test]
fn central_write_fires_characteristic_handler() {
    static WRITES: AtomicUsize = AtomicUsize::new(0);
    static SUBSCRIPTIONS: Mutex<Vec<bool>> = Mutex::new(Vec::new());

    let mut peripheral = Peripheral::new(MockTransceiver::new());
    let level = battery_peripheral(&mut peripheral);
    peripheral
        .set_characteristic_event_handler(level, CharacteristicEventKind::Written, |central, characteristic| {
            assert!(central.is_connected());
            WRITES.store(characteristic.value()[0] as usize, Ordering::Relaxed);
        })
        .unwrap();
    peripheral
        .set_characteristic_event_handler(level, CharacteristicEventKind::Subscribed, |_, _| {
            SUBSCRIPTIONS.lock().unwrap().push(true);
        })
        .unwrap();
    peripheral
        .set_characteristic_event_handler(level, CharacteristicEventKind::Unsubscribed, |_, _| {
            SUBSCRIPTIONS.lock().unwrap().push(false);
        })
        .unwrap();
    peripheral.begin().unwrap();

    let mock = peripheral.transceiver_mut();
    mock.enqueue(MockEvent::Connected(BdAddr::new(ADDR_1)));
    mock.enqueue(MockEvent::written(level, &[42]));
    mock.enqueue(MockEvent::CharacteristicSubscriptionChanged {
        handle: level,
        subscribed: true,
    });
    peripheral.poll();

    assert_eq!(WRITES.load(Ordering::Relaxed), 42);
    assert_eq!(peripheral.value(level).unwrap(), &[42]);
    assert!(peripheral.subscribed(level).unwrap());
    assert!(peripheral.take_written(level).unwrap());
    assert!(!peripheral.take_written(level).unwrap());

    peripheral
        .transceiver_mut()
        .enqueue(MockEvent::CharacteristicSubscriptionChanged {
            handle: level,
            subscribed: false,
        });
    peripheral.poll();
    assert!(!peripheral.subscribed(level).unwrap());
    assert_eq!(*SUBSCRIPTIONS.lock().unwrap(), vec![true, false]);
}

#[test]
fn notify_and_indicate_checks() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    let level = battery_peripheral(&mut peripheral);
    assert!(!peripheral.can_notify(level));

    peripheral.begin().unwrap();
    assert!(peripheral.can_notify(level));
    assert!(!peripheral.can_indicate(level));
    assert!(!peripheral.can_notify(LocalHandle::from(0)));

    peripheral.transceiver_mut().accept_checks = false;
    assert!(!peripheral.can_notify(level));
}

#[test]
fn broadcast_requires_property() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    let level = battery_peripheral(&mut peripheral);
    let beacon = unwrap_ok(peripheral.add_local_attribute(LocalCharacteristic::new(
        0x2a6eu16,
        [CharacteristicProp::Read, CharacteristicProp::Broadcast],
        2,
    )));
    peripheral.begin().unwrap();

    assert_eq!(peripheral.broadcast_characteristic(level), Err(Error::UnsupportedOperation));
    peripheral.broadcast_characteristic(beacon).unwrap();
    assert_eq!(&peripheral.transceiver().broadcasts[..], &[beacon]);
}

#[test]
fn remote_operations() {
    static UPDATES: AtomicUsize = AtomicUsize::new(0);

    let mut peripheral = Peripheral::new(MockTransceiver::new());
    unwrap_ok(peripheral.add_remote_attribute(RemoteService::new(BATTERY_SERVICE)));
    let level = unwrap_ok(peripheral.add_remote_attribute(RemoteCharacteristic::new(
        BATTERY_LEVEL,
        [CharacteristicProp::Read, CharacteristicProp::Notify],
    )));
    peripheral
        .set_remote_characteristic_event_handler(level, |_, characteristic| {
            UPDATES.fetch_add(characteristic.value().len(), Ordering::Relaxed);
        })
        .unwrap();
    peripheral.begin().unwrap();

    assert_eq!(peripheral.read_remote(level), Err(Error::NotConnected));
    assert!(!peripheral.can_read_remote(level));

    peripheral.transceiver_mut().enqueue(MockEvent::Connected(BdAddr::new(ADDR_1)));
    peripheral.poll();

    assert!(peripheral.can_read_remote(level));
    assert!(!peripheral.can_write_remote(level));
    peripheral.read_remote(level).unwrap();
    peripheral.subscribe_remote(level).unwrap();
    peripheral.unsubscribe_remote(level).unwrap();
    assert_eq!(peripheral.write_remote(level, &[1]), Err(Error::UnsupportedOperation));
    assert_eq!(peripheral.read_remote(0u16.into()), Err(Error::NotFound));

    let mock = peripheral.transceiver();
    assert_eq!(&mock.remote_reads[..], &[level]);
    assert_eq!(&mock.remote_subscriptions[..], &[(level, true), (level, false)]);

    peripheral.transceiver_mut().accept_requests = false;
    assert_eq!(peripheral.read_remote(level), Err(Error::Busy));

    peripheral.transceiver_mut().enqueue(MockEvent::remote_value(level, &[55, 66]));
    peripheral.poll();
    assert_eq!(peripheral.remote_value(level).unwrap(), &[55, 66]);
    assert_eq!(UPDATES.load(Ordering::Relaxed), 2);
    assert!(peripheral.take_value_updated(level).unwrap());
    assert!(!peripheral.take_value_updated(level).unwrap());
}

#[test]
fn remote_write_goes_through() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    let control = unwrap_ok(peripheral.add_remote_attribute(RemoteCharacteristic::new(
        0x2a39u16,
        [CharacteristicProp::WriteWithoutResponse],
    )));
    peripheral.begin().unwrap();
    peripheral.transceiver_mut().enqueue(MockEvent::Connected(BdAddr::new(ADDR_2)));

    assert!(peripheral.connected());
    peripheral.write_remote(control, &[1, 2, 3]).unwrap();
    let writes = &peripheral.transceiver().remote_writes;
    assert_eq!(writes.len(), 1);
    assert_eq!(&writes[0].1[..], &[1, 2, 3]);
}

#[test]
fn device_events_reach_handlers() {
    static ADDRESS: Mutex<Option<BdAddr>> = Mutex::new(None);
    static NAMES: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.set_device_event_handler(DeviceEventKind::AddressReceived, |event| {
        if let DeviceEvent::AddressReceived(address) = event {
            *ADDRESS.lock().unwrap() = Some(*address);
        }
    });
    peripheral.set_device_event_handler(DeviceEventKind::AdvertisementReceived, |event| {
        if let DeviceEvent::AdvertisementReceived(data) = event {
            for structure in AdStructure::decode(data).flatten() {
                if let AdStructure::CompleteLocalName(name) = structure {
                    NAMES.lock().unwrap().push(name.to_vec());
                }
            }
        }
    });
    peripheral.begin().unwrap();
    peripheral.start_scanning();
    assert!(peripheral.transceiver().scanning);

    let mock = peripheral.transceiver_mut();
    mock.enqueue(MockEvent::AddressReceived(BdAddr::new(ADDR_2)));
    mock.enqueue(MockEvent::TemperatureReceived(21.0));
    mock.enqueue(MockEvent::advertisement(&[0x02, 0x01, 0x06, 0x04, 0x09, b'a', b'b', b'c']));
    peripheral.poll();

    assert_eq!(*ADDRESS.lock().unwrap(), Some(BdAddr::new(ADDR_2)));
    assert_eq!(*NAMES.lock().unwrap(), vec![b"abc".to_vec()]);
}

#[test]
fn start_advertising_pushes_current_data() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.begin().unwrap();
    assert_eq!(peripheral.transceiver().advertising_data.as_ref().map(|d| d.records().len()), Some(0));

    let uuid: Uuid = "19b10000-e8f2-537e-4f6c-d104768a1214".parse().unwrap();
    peripheral.set_advertised_service_uuid(uuid);
    peripheral.set_manufacturer_data(&[0x59, 0x00, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13]);
    peripheral.start_advertising();

    let mock = peripheral.transceiver();
    assert!(mock.advertising);
    let data = mock.advertising_data.as_ref().unwrap();
    assert_eq!(data.records().len(), 2);
    assert_eq!(data.records()[0].ty(), ad_type::INCOMPLETE_SERVICE_UUIDS_128);
    assert_eq!(data.records()[1].ty(), ad_type::MANUFACTURER_SPECIFIC_DATA);
    assert_eq!(data.records()[1].len(), 8);
    assert!(data.truncated_manufacturer_data());

    peripheral.stop_advertising();
    assert!(!peripheral.transceiver().advertising);
}

#[test]
fn narrow_limits_shorten_local_name() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.set_advertising_limits(AdvertisingLimits::new(26, 10));
    peripheral.set_local_name("A name of twenty-five chr");

    let data = peripheral.advertising_data();
    let scan = data.scan_response().unwrap();
    assert_eq!(scan.ty(), ad_type::SHORTENED_LOCAL_NAME);
    assert_eq!(scan.len(), 10);
    assert!(data.truncated_local_name());
}

#[test]
fn radio_settings_are_forwarded() {
    let mut peripheral = Peripheral::new(MockTransceiver::new());
    peripheral.set_connectable(true);
    peripheral.set_advertising_interval(Duration::from_millis(100));
    peripheral.set_connection_interval(Duration::from_micros(7_500), Duration::from_millis(30));
    peripheral.set_tx_power(4).unwrap();

    let mut store: MemoryBondStore = MemoryBondStore::new();
    assert!(store.put_data(0, &ADDR_1));
    peripheral.set_bond_store(store);

    let mock = peripheral.transceiver();
    assert!(mock.connectable);
    assert_eq!(mock.advertising_interval, Some(Duration::from_millis(100)));
    assert_eq!(
        mock.connection_interval,
        Some((Duration::from_micros(7_500), Duration::from_millis(30)))
    );
    assert_eq!(mock.tx_power, Some(4));
    assert!(mock.bond_store.as_ref().is_some_and(|s| s.has_data()));

    peripheral.transceiver_mut().accept_requests = false;
    assert_eq!(peripheral.set_tx_power(-40), Err(Error::UnsupportedOperation));

    peripheral.disconnect();
    assert_eq!(peripheral.transceiver().disconnects, 1);
}

static RADIO_ENDS: AtomicUsize = AtomicUsize::new(0);

/// Transceiver that only counts how often it was stopped.
struct CountingRadio;

impl Transceiver for CountingRadio {
    type BondStore = MemoryBondStore;

    fn begin(&mut self, _advertising: &AdvertisingData, _local: &[LocalAttribute], _remote: &[RemoteAttribute]) {}

    fn end(&mut self) {
        RADIO_ENDS.fetch_add(1, Ordering::Relaxed);
    }

    fn poll<L: EventListener>(&mut self, _listener: &mut L) {}

    fn update_advertising_data(&mut self, _advertising: &AdvertisingData) {}

    fn start_advertising(&mut self) {}

    fn stop_advertising(&mut self) {}

    fn set_advertising_interval(&mut self, _interval: Duration) {}

    fn set_connectable(&mut self, _connectable: bool) {}

    fn set_connection_interval(&mut self, _min: Duration, _max: Duration) {}

    fn disconnect(&mut self) {}

    fn request_address(&mut self) {}

    fn set_bond_store(&mut self, _store: Self::BondStore) {}

    fn update_characteristic_value(&mut self, _handle: LocalHandle, _characteristic: &LocalCharacteristic) -> bool {
        false
    }

    fn can_notify_characteristic(&self, _handle: LocalHandle, _characteristic: &LocalCharacteristic) -> bool {
        false
    }

    fn can_indicate_characteristic(&self, _handle: LocalHandle, _characteristic: &LocalCharacteristic) -> bool {
        false
    }
}

#[test]
fn drop_stops_transceiver() {
    let mut peripheral = Peripheral::new(CountingRadio);
    peripheral.begin().unwrap();
    assert_eq!(RADIO_ENDS.load(Ordering::Relaxed), 0);

    drop(peripheral);
    assert_eq!(RADIO_ENDS.load(Ordering::Relaxed), 1);
}
