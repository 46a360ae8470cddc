//! Compile-time configuration.
//!
//! `peripheral-observer` sizes its attribute tables and buffers at compile time. The settings
//! are read from environment variables at build time: set the variable named
//! `PERIPHERAL_OBSERVER_<name>`. For example `PERIPHERAL_OBSERVER_LOCAL_ATTRIBUTES_MAX=48 cargo build`.
//! You can also set them in the `[env]` section of `.cargo/config.toml`.
//!
//! Values outside the allowed range fail the build.

mod raw {
    #![allow(unused)]
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

/// Local attribute table capacity
///
/// Number of local attributes (services, characteristics and descriptors), including the five
/// generic access and generic attribute entries that are always present.
///
/// Default: 32.
pub const LOCAL_ATTRIBUTES_MAX: usize = raw::LOCAL_ATTRIBUTES_MAX;

/// Remote attribute table capacity
///
/// Includes the two generic attribute mirror entries appended when any remote attribute is
/// registered.
///
/// Default: 16.
pub const REMOTE_ATTRIBUTES_MAX: usize = raw::REMOTE_ATTRIBUTES_MAX;

/// Attribute value storage
///
/// Upper bound for the value of any characteristic or descriptor. Declared maximum lengths
/// above this are clamped.
///
/// Default: 20.
pub const ATTRIBUTE_VALUE_MAX: usize = raw::ATTRIBUTE_VALUE_MAX;

/// Advertising data value length
///
/// Largest payload of a single advertising record. The advertising budget is this plus
/// two header bytes.
///
/// Default: 26.
pub const ADVERTISEMENT_DATA_MAX: usize = raw::ADVERTISEMENT_DATA_MAX;

/// Scan response value length
///
/// Largest local name carried in the scan response before it is shortened.
///
/// Default: 29.
pub const SCAN_DATA_MAX: usize = raw::SCAN_DATA_MAX;
