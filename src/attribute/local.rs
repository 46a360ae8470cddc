use super::{store_value, AttributeType, CharacteristicProp, CharacteristicProps, Uuid, Value};
use crate::config::ATTRIBUTE_VALUE_MAX;
use crate::event::{CharacteristicEventHandler, CharacteristicEventKind, HandlerTable};

/// A service served by this device.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalService {
    uuid: Uuid,
}

impl LocalService {
    /// Create a new service with a uuid.
    pub fn new<U: Into<Uuid>>(uuid: U) -> Self {
        Self { uuid: uuid.into() }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }
}

/// A characteristic served by this device.
///
/// The value is bounded by the declared maximum length. Values written by the application are
/// pushed to the transceiver once the peripheral has begun; values written by the central mark
/// the characteristic as written and fire its [`CharacteristicEventKind::Written`] handler.
#[derive(Debug, Clone)]
pub struct LocalCharacteristic {
    uuid: Uuid,
    props: CharacteristicProps,
    max_len: usize,
    value: Value,
    written: bool,
    subscribed: bool,
    attached: bool,
    handlers: HandlerTable<CharacteristicEventKind, CharacteristicEventHandler, { CharacteristicEventKind::COUNT }>,
}

impl LocalCharacteristic {
    /// Create a characteristic holding up to `max_len` bytes.
    ///
    /// `max_len` is clamped to the configured attribute value storage.
    pub fn new<U: Into<Uuid>, P: Into<CharacteristicProps>>(uuid: U, props: P, max_len: usize) -> Self {
        if max_len > ATTRIBUTE_VALUE_MAX {
            warn!(
                "[attribute] max length {} clamped to {}",
                max_len, ATTRIBUTE_VALUE_MAX
            );
        }
        Self {
            uuid: uuid.into(),
            props: props.into(),
            max_len: max_len.min(ATTRIBUTE_VALUE_MAX),
            value: Value::new(),
            written: false,
            subscribed: false,
            attached: false,
            handlers: HandlerTable::new(),
        }
    }

    /// Set the initial value.
    pub fn with_value(mut self, value: &[u8]) -> Self {
        store_value(&mut self.value, self.max_len, value);
        self
    }

    /// Register a handler, replacing any previous one for the same kind.
    pub fn set_event_handler(&mut self, kind: CharacteristicEventKind, handler: CharacteristicEventHandler) {
        self.handlers.set(kind, handler);
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn props(&self) -> CharacteristicProps {
        self.props
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The central wrote a value not yet consumed by [`LocalCharacteristic::take_written`].
    pub fn written(&self) -> bool {
        self.written
    }

    /// Whether the central enabled notifications or indications.
    pub fn subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn can_notify_or_indicate(&self) -> bool {
        self.props.any(&[CharacteristicProp::Notify, CharacteristicProp::Indicate])
    }

    pub(crate) fn take_written(&mut self) -> bool {
        core::mem::replace(&mut self.written, false)
    }

    pub(crate) fn attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn attach(&mut self) {
        self.attached = true;
    }

    pub(crate) fn set_value(&mut self, value: &[u8]) -> usize {
        store_value(&mut self.value, self.max_len, value)
    }

    pub(crate) fn write_from_central(&mut self, value: &[u8]) {
        store_value(&mut self.value, self.max_len, value);
        self.written = true;
    }

    pub(crate) fn set_subscribed(&mut self, subscribed: bool) {
        self.subscribed = subscribed;
    }

    pub(crate) fn handler(&self, kind: CharacteristicEventKind) -> Option<CharacteristicEventHandler> {
        self.handlers.get(kind)
    }
}

/// A descriptor with a fixed value.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDescriptor {
    uuid: Uuid,
    value: Value,
}

impl LocalDescriptor {
    pub fn new<U: Into<Uuid>>(uuid: U, value: &[u8]) -> Self {
        let mut stored = Value::new();
        store_value(&mut stored, ATTRIBUTE_VALUE_MAX, value);
        Self {
            uuid: uuid.into(),
            value: stored,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// An entry of the local attribute table.
#[derive(Debug, Clone)]
pub enum LocalAttribute {
    Service(LocalService),
    Characteristic(LocalCharacteristic),
    Descriptor(LocalDescriptor),
}

impl LocalAttribute {
    pub fn uuid(&self) -> &Uuid {
        match self {
            LocalAttribute::Service(s) => s.uuid(),
            LocalAttribute::Characteristic(c) => c.uuid(),
            LocalAttribute::Descriptor(d) => d.uuid(),
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            LocalAttribute::Service(_) => AttributeType::Service,
            LocalAttribute::Characteristic(_) => AttributeType::Characteristic,
            LocalAttribute::Descriptor(_) => AttributeType::Descriptor,
        }
    }

    pub fn as_characteristic(&self) -> Option<&LocalCharacteristic> {
        match self {
            LocalAttribute::Characteristic(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_characteristic_mut(&mut self) -> Option<&mut LocalCharacteristic> {
        match self {
            LocalAttribute::Characteristic(c) => Some(c),
            _ => None,
        }
    }
}

impl From<LocalService> for LocalAttribute {
    fn from(service: LocalService) -> Self {
        LocalAttribute::Service(service)
    }
}

impl From<LocalCharacteristic> for LocalAttribute {
    fn from(characteristic: LocalCharacteristic) -> Self {
        LocalAttribute::Characteristic(characteristic)
    }
}

impl From<LocalDescriptor> for LocalAttribute {
    fn from(descriptor: LocalDescriptor) -> Self {
        LocalAttribute::Descriptor(descriptor)
    }
}
