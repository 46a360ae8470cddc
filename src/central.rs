//! The connected central.
use bt_hci::param::BdAddr;

/// The peer holding the connection to this peripheral, if any.
///
/// Only one central is tracked at a time.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Central {
    address: Option<BdAddr>,
}

impl Central {
    /// A disconnected central.
    pub const fn new() -> Self {
        Self { address: None }
    }

    /// Address of the connected central.
    pub fn address(&self) -> Option<BdAddr> {
        self.address
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub(crate) fn connect(&mut self, address: BdAddr) {
        self.address = Some(address);
    }

    pub(crate) fn disconnect(&mut self) {
        self.address = None;
    }
}
