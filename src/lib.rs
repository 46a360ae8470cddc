//! Peripheral role control layer for BLE devices.
//!
//! The crate keeps the local and remote attribute tables, builds advertising data, tracks the
//! connected central and dispatches transceiver events to application handlers. The radio itself
//! is abstracted by the [`transceiver::Transceiver`] trait.
#![no_std]

mod fmt;

mod codec;
mod cursor;
mod dispatch;
pub mod types;

pub mod ad_structure;
pub mod advertise;
pub mod attribute;
pub mod central;
pub mod config;
pub mod event;
pub mod mock;
pub mod peripheral;
pub mod transceiver;

pub use bt_hci::param::BdAddr;
pub use central::Central;
pub use codec::Error as CodecError;
pub use peripheral::Peripheral;
pub use types::uuid::Uuid;

/// Errors returned by the peripheral.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The attribute table is full.
    CapacityExceeded,
    /// The transceiver does not support the operation, or the tables are already finalized.
    UnsupportedOperation,
    /// No central is connected.
    NotConnected,
    /// The transceiver declined the request. It may be retried.
    Busy,
    /// The handle does not name an attribute of the required kind.
    NotFound,
    /// Not a 16 or 128 bit UUID.
    InvalidUuid,
    /// Raw event code outside the handler table.
    InvalidEventKind(u8),
    Codec(codec::Error),
}

impl From<codec::Error> for Error {
    fn from(error: codec::Error) -> Self {
        Self::Codec(error)
    }
}
