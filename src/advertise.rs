//! Advertising payload construction.
//!
//! The advertising packet is assembled from the configured solicitation UUID, advertised service
//! UUID and manufacturer data, in that order, until the byte budget runs out. The local name
//! always goes into the scan response.
use heapless::Vec;

use crate::ad_structure::{ad_type, AdStructure};
use crate::codec;
use crate::config::{ADVERTISEMENT_DATA_MAX, SCAN_DATA_MAX};
use crate::cursor::WriteCursor;
use crate::types::uuid::Uuid;

/// Largest payload a single record can carry: 31 bytes minus the length and type bytes.
pub const AD_PAYLOAD_MAX: usize = 29;

/// Largest advertising value: the flags record takes 3 of the 31 bytes and the value's own
/// record header 2 more.
pub const AD_VALUE_MAX: usize = 26;

/// Maximum number of records in the advertising packet.
pub const AD_RECORDS_MAX: usize = 3;

/// Byte budgets used when building advertising data.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingLimits {
    data_budget: usize,
    scan_data_max: usize,
}

impl AdvertisingLimits {
    /// Limits with the given advertising value length and scan response value length.
    ///
    /// The advertising length is clamped to [`AD_VALUE_MAX`], the scan response length to
    /// [`AD_PAYLOAD_MAX`].
    pub const fn new(advertisement_data_max: usize, scan_data_max: usize) -> Self {
        let advertisement_data_max = if advertisement_data_max > AD_VALUE_MAX {
            AD_VALUE_MAX
        } else {
            advertisement_data_max
        };
        let scan_data_max = if scan_data_max > AD_PAYLOAD_MAX {
            AD_PAYLOAD_MAX
        } else {
            scan_data_max
        };
        Self {
            data_budget: advertisement_data_max + 2,
            scan_data_max,
        }
    }

    /// Total bytes, headers included, available to advertising records.
    pub fn data_budget(&self) -> usize {
        self.data_budget
    }

    /// Longest local name carried in the scan response.
    pub fn scan_data_max(&self) -> usize {
        self.scan_data_max
    }
}

impl Default for AdvertisingLimits {
    fn default() -> Self {
        Self::new(ADVERTISEMENT_DATA_MAX, SCAN_DATA_MAX)
    }
}

/// One `type | payload` record of an advertising packet.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdRecord {
    ty: u8,
    data: Vec<u8, AD_PAYLOAD_MAX>,
}

impl AdRecord {
    /// Create a record, keeping at most [`AD_PAYLOAD_MAX`] bytes of `data`.
    pub fn new(ty: u8, data: &[u8]) -> Self {
        let len = data.len().min(AD_PAYLOAD_MAX);
        Self {
            ty,
            data: Vec::from_slice(&data[..len]).unwrap_or_default(),
        }
    }

    /// AD type code.
    pub fn ty(&self) -> u8 {
        self.ty
    }

    /// Payload length. The length byte on air is one more, since it also counts the type.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// View this record as a typed AD structure.
    pub fn as_ad_structure(&self) -> AdStructure<'_> {
        AdStructure::from_parts(self.ty, &self.data)
    }

    pub(crate) fn encode(&self, w: &mut WriteCursor<'_>) -> Result<(), codec::Error> {
        self.as_ad_structure().encode(w)
    }
}

/// Advertising records plus the optional scan response, ready for the transceiver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisingData {
    records: Vec<AdRecord, AD_RECORDS_MAX>,
    scan_response: Option<AdRecord>,
    manufacturer_data_truncated: bool,
    local_name_truncated: bool,
}

impl AdvertisingData {
    pub fn records(&self) -> &[AdRecord] {
        &self.records
    }

    pub fn scan_response(&self) -> Option<&AdRecord> {
        self.scan_response.as_ref()
    }

    pub fn has_scan_response(&self) -> bool {
        self.scan_response.is_some()
    }

    /// Manufacturer data was cut to fit the remaining budget.
    pub fn truncated_manufacturer_data(&self) -> bool {
        self.manufacturer_data_truncated
    }

    /// The local name was shortened to fit the scan response.
    pub fn truncated_local_name(&self) -> bool {
        self.local_name_truncated
    }

    /// Serialize the advertising records into `dest`, returning the number of bytes written.
    pub fn encode_advertising(&self, dest: &mut [u8]) -> Result<usize, codec::Error> {
        let mut w = WriteCursor::new(dest);
        for record in self.records.iter() {
            record.encode(&mut w)?;
        }
        Ok(w.len())
    }

    /// Serialize the scan response into `dest`, returning the number of bytes written.
    pub fn encode_scan_response(&self, dest: &mut [u8]) -> Result<usize, codec::Error> {
        let mut w = WriteCursor::new(dest);
        if let Some(record) = self.scan_response.as_ref() {
            record.encode(&mut w)?;
        }
        Ok(w.len())
    }

    fn push(&mut self, record: AdRecord) {
        if self.records.push(record).is_err() {
            warn!("[adv] record dropped, packet full");
        }
    }
}

/// Application-provided advertising content.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvertisingSettings<'d> {
    pub advertised_service_uuid: Option<Uuid>,
    pub service_solicitation_uuid: Option<Uuid>,
    pub manufacturer_data: &'d [u8],
    pub local_name: Option<&'d str>,
}

impl<'d> AdvertisingSettings<'d> {
    /// Compute the advertising records and scan response.
    ///
    /// Records are added in a fixed order: solicitation UUID, advertised service UUID,
    /// manufacturer data. A UUID record that does not fit the remaining budget is left out.
    /// Manufacturer data is truncated to fit once at least 3 bytes remain. The local name is
    /// shortened to the scan response limit.
    pub fn build(&self, limits: &AdvertisingLimits) -> AdvertisingData {
        let mut data = AdvertisingData::default();
        let mut remaining = limits.data_budget();

        if let Some(uuid) = self.service_solicitation_uuid.as_ref() {
            let ty = if uuid.is_long() {
                ad_type::SERVICE_SOLICITATION_128
            } else {
                ad_type::SERVICE_SOLICITATION_16
            };
            if uuid.len() + 2 <= remaining {
                data.push(AdRecord::new(ty, uuid.as_raw()));
                remaining -= uuid.len() + 2;
            } else {
                warn!("[adv] solicitation uuid does not fit {} bytes, omitted", remaining);
            }
        }

        if let Some(uuid) = self.advertised_service_uuid.as_ref() {
            let ty = if uuid.is_long() {
                ad_type::INCOMPLETE_SERVICE_UUIDS_128
            } else {
                ad_type::INCOMPLETE_SERVICE_UUIDS_16
            };
            if uuid.len() + 2 <= remaining {
                data.push(AdRecord::new(ty, uuid.as_raw()));
                remaining -= uuid.len() + 2;
            } else {
                debug!("[adv] service uuid does not fit {} bytes, omitted", remaining);
            }
        }

        if !self.manufacturer_data.is_empty() && remaining >= 3 {
            let mut len = self.manufacturer_data.len();
            if len + 2 > remaining {
                len = remaining - 2;
                data.manufacturer_data_truncated = true;
                debug!(
                    "[adv] manufacturer data truncated from {} to {} bytes",
                    self.manufacturer_data.len(),
                    len
                );
            }
            data.push(AdRecord::new(
                ad_type::MANUFACTURER_SPECIFIC_DATA,
                &self.manufacturer_data[..len],
            ));
        }

        if let Some(name) = self.local_name.filter(|name| !name.is_empty()) {
            let name = name.as_bytes();
            let len = name.len().min(limits.scan_data_max());
            data.local_name_truncated = len < name.len();
            let ty = if data.local_name_truncated {
                ad_type::SHORTENED_LOCAL_NAME
            } else {
                ad_type::COMPLETE_LOCAL_NAME
            };
            if len > 0 {
                data.scan_response = Some(AdRecord::new(ty, &name[..len]));
            }
        }

        trace!(
            "[adv] built {} records, scan response {}",
            data.records.len(),
            data.has_scan_response()
        );
        data
    }
}
