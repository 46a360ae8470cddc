use super::{store_value, AttributeType, CharacteristicProps, Uuid, Value};
use crate::config::ATTRIBUTE_VALUE_MAX;
use crate::event::RemoteCharacteristicEventHandler;

/// A service expected on the central.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteService {
    uuid: Uuid,
}

impl RemoteService {
    pub fn new<U: Into<Uuid>>(uuid: U) -> Self {
        Self { uuid: uuid.into() }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }
}

/// A characteristic expected on the central.
///
/// Its value is filled in by completed reads and by notifications or indications.
#[derive(Clone)]
pub struct RemoteCharacteristic {
    uuid: Uuid,
    props: CharacteristicProps,
    value: Value,
    value_updated: bool,
    attached: bool,
    handler: Option<RemoteCharacteristicEventHandler>,
}

impl RemoteCharacteristic {
    pub fn new<U: Into<Uuid>, P: Into<CharacteristicProps>>(uuid: U, props: P) -> Self {
        Self {
            uuid: uuid.into(),
            props: props.into(),
            value: Value::new(),
            value_updated: false,
            attached: false,
            handler: None,
        }
    }

    /// Register the value updated handler, replacing any previous one.
    pub fn set_event_handler(&mut self, handler: RemoteCharacteristicEventHandler) {
        self.handler = Some(handler);
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn props(&self) -> CharacteristicProps {
        self.props
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// A value arrived that was not yet consumed by `take_value_updated`.
    pub fn value_updated(&self) -> bool {
        self.value_updated
    }

    pub(crate) fn take_value_updated(&mut self) -> bool {
        core::mem::replace(&mut self.value_updated, false)
    }

    pub(crate) fn attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn attach(&mut self) {
        self.attached = true;
    }

    pub(crate) fn update_from_central(&mut self, value: &[u8]) {
        store_value(&mut self.value, ATTRIBUTE_VALUE_MAX, value);
        self.value_updated = true;
    }

    pub(crate) fn handler(&self) -> Option<RemoteCharacteristicEventHandler> {
        self.handler
    }
}

impl core::fmt::Debug for RemoteCharacteristic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RemoteCharacteristic")
            .field("uuid", &self.uuid)
            .field("props", &self.props)
            .field("value", &self.value)
            .field("value_updated", &self.value_updated)
            .field("attached", &self.attached)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// An entry of the remote attribute table.
#[derive(Debug, Clone)]
pub enum RemoteAttribute {
    Service(RemoteService),
    Characteristic(RemoteCharacteristic),
}

impl RemoteAttribute {
    pub fn uuid(&self) -> &Uuid {
        match self {
            RemoteAttribute::Service(s) => s.uuid(),
            RemoteAttribute::Characteristic(c) => c.uuid(),
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            RemoteAttribute::Service(_) => AttributeType::Service,
            RemoteAttribute::Characteristic(_) => AttributeType::Characteristic,
        }
    }

    pub fn as_characteristic(&self) -> Option<&RemoteCharacteristic> {
        match self {
            RemoteAttribute::Characteristic(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_characteristic_mut(&mut self) -> Option<&mut RemoteCharacteristic> {
        match self {
            RemoteAttribute::Characteristic(c) => Some(c),
            _ => None,
        }
    }
}

impl From<RemoteService> for RemoteAttribute {
    fn from(service: RemoteService) -> Self {
        RemoteAttribute::Service(service)
    }
}

impl From<RemoteCharacteristic> for RemoteAttribute {
    fn from(characteristic: RemoteCharacteristic) -> Self {
        RemoteAttribute::Characteristic(characteristic)
    }
}
