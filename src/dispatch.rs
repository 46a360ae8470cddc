//! Routing of transceiver events to peripheral state and user handlers.
use crate::attribute::{
    AttributeTable, CharacteristicProp, LocalAttribute, LocalCharacteristic, LocalHandle, LocalService, RemoteAttribute,
    RemoteCharacteristic, RemoteHandle, CHARACTERISTIC_APPEARANCE_UUID16, CHARACTERISTIC_DEVICE_NAME_UUID16,
    CHARACTERISTIC_SERVICES_CHANGED_UUID16, DEFAULT_APPEARANCE, DEFAULT_DEVICE_NAME, DEVICE_NAME_MAX,
    GENERIC_ACCESS_SERVICE_UUID16, GENERIC_ATTRIBUTE_SERVICE_UUID16, SYSTEM_ATTRIBUTES,
};
use crate::central::Central;
use crate::config::{LOCAL_ATTRIBUTES_MAX, REMOTE_ATTRIBUTES_MAX};
use crate::event::{
    CharacteristicEventKind, DeviceEventHandler, DeviceEventKind, EventListener, HandlerTable,
    PeripheralEventHandler, PeripheralEventKind, TransceiverEvent,
};
use crate::Error;

const _: () = assert!(LOCAL_ATTRIBUTES_MAX >= SYSTEM_ATTRIBUTES);

pub(crate) type LocalTable = AttributeTable<LocalAttribute, LOCAL_ATTRIBUTES_MAX>;
pub(crate) type RemoteTable = AttributeTable<RemoteAttribute, REMOTE_ATTRIBUTES_MAX>;

/// Everything the peripheral owns besides the transceiver.
pub(crate) struct PeripheralState {
    pub(crate) central: Central,
    pub(crate) local: LocalTable,
    pub(crate) remote: RemoteTable,
    pub(crate) handlers: HandlerTable<PeripheralEventKind, PeripheralEventHandler, { PeripheralEventKind::COUNT }>,
    pub(crate) device_handlers: HandlerTable<DeviceEventKind, DeviceEventHandler, { DeviceEventKind::COUNT }>,
}

impl PeripheralState {
    /// State with the generic access and generic attribute entries at the head of the local table.
    pub(crate) fn new() -> Self {
        let mut local = LocalTable::new();
        let system: [LocalAttribute; SYSTEM_ATTRIBUTES] = [
            LocalService::new(GENERIC_ACCESS_SERVICE_UUID16).into(),
            LocalCharacteristic::new(CHARACTERISTIC_DEVICE_NAME_UUID16, [CharacteristicProp::Read], DEVICE_NAME_MAX)
                .with_value(DEFAULT_DEVICE_NAME.as_bytes())
                .into(),
            LocalCharacteristic::new(CHARACTERISTIC_APPEARANCE_UUID16, [CharacteristicProp::Read], 2)
                .with_value(&DEFAULT_APPEARANCE.to_le_bytes())
                .into(),
            LocalService::new(GENERIC_ATTRIBUTE_SERVICE_UUID16).into(),
            LocalCharacteristic::new(CHARACTERISTIC_SERVICES_CHANGED_UUID16, [CharacteristicProp::Indicate], 4).into(),
        ];
        for attribute in system {
            // Capacity asserted at compile time.
            unwrap!(local.push(attribute));
        }

        Self {
            central: Central::new(),
            local,
            remote: RemoteTable::new(),
            handlers: HandlerTable::new(),
            device_handlers: HandlerTable::new(),
        }
    }

    pub(crate) fn local_characteristic(&self, handle: LocalHandle) -> Result<&LocalCharacteristic, Error> {
        self.local
            .get(handle.index())
            .and_then(LocalAttribute::as_characteristic)
            .ok_or(Error::NotFound)
    }

    pub(crate) fn local_characteristic_mut(&mut self, handle: LocalHandle) -> Result<&mut LocalCharacteristic, Error> {
        self.local
            .get_mut(handle.index())
            .and_then(LocalAttribute::as_characteristic_mut)
            .ok_or(Error::NotFound)
    }

    pub(crate) fn remote_characteristic(&self, handle: RemoteHandle) -> Result<&RemoteCharacteristic, Error> {
        self.remote
            .get(handle.index())
            .and_then(RemoteAttribute::as_characteristic)
            .ok_or(Error::NotFound)
    }

    pub(crate) fn remote_characteristic_mut(
        &mut self,
        handle: RemoteHandle,
    ) -> Result<&mut RemoteCharacteristic, Error> {
        self.remote
            .get_mut(handle.index())
            .and_then(RemoteAttribute::as_characteristic_mut)
            .ok_or(Error::NotFound)
    }

    fn notify(&self, kind: PeripheralEventKind) {
        if let Some(handler) = self.handlers.get(kind) {
            handler(&self.central);
        }
    }
}

impl EventListener for PeripheralState {
    fn on_event(&mut self, event: TransceiverEvent<'_>) {
        trace!("[dispatch] {:?}", event);
        match event {
            TransceiverEvent::Connected(address) => {
                info!("[dispatch] central connected: {:?}", address);
                self.central.connect(address);
                self.notify(PeripheralEventKind::Connected);
            }
            TransceiverEvent::Disconnected => {
                info!("[dispatch] central disconnected: {:?}", self.central.address());
                self.notify(PeripheralEventKind::Disconnected);
                self.central.disconnect();
            }
            TransceiverEvent::Bonded => {
                debug!("[dispatch] bonded: {:?}", self.central.address());
                self.notify(PeripheralEventKind::Bonded);
            }
            TransceiverEvent::RemoteServicesDiscovered => {
                debug!("[dispatch] remote services discovered");
                self.notify(PeripheralEventKind::RemoteServicesDiscovered);
            }
            TransceiverEvent::CharacteristicValueChanged { handle, value } => {
                let Some(characteristic) = self
                    .local
                    .get_mut(handle.index())
                    .and_then(LocalAttribute::as_characteristic_mut)
                else {
                    warn!("[dispatch] write to unknown characteristic {:?}", handle);
                    return;
                };
                characteristic.write_from_central(value);
                if let Some(handler) = characteristic.handler(CharacteristicEventKind::Written) {
                    handler(&self.central, characteristic);
                }
            }
            TransceiverEvent::CharacteristicSubscriptionChanged { handle, subscribed } => {
                let Some(characteristic) = self
                    .local
                    .get_mut(handle.index())
                    .and_then(LocalAttribute::as_characteristic_mut)
                else {
                    warn!("[dispatch] subscription to unknown characteristic {:?}", handle);
                    return;
                };
                characteristic.set_subscribed(subscribed);
                let kind = if subscribed {
                    CharacteristicEventKind::Subscribed
                } else {
                    CharacteristicEventKind::Unsubscribed
                };
                if let Some(handler) = characteristic.handler(kind) {
                    handler(&self.central, characteristic);
                }
            }
            TransceiverEvent::RemoteCharacteristicValueChanged { handle, value } => {
                let Some(characteristic) = self
                    .remote
                    .get_mut(handle.index())
                    .and_then(RemoteAttribute::as_characteristic_mut)
                else {
                    warn!("[dispatch] value for unknown remote characteristic {:?}", handle);
                    return;
                };
                characteristic.update_from_central(value);
                if let Some(handler) = characteristic.handler() {
                    handler(&self.central, characteristic);
                }
            }
            TransceiverEvent::Device(event) => {
                if let Some(handler) = self.device_handlers.get(event.kind()) {
                    handler(&event);
                }
            }
        }
    }
}
