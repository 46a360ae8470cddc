use std::fmt::Write;
use std::path::PathBuf;
use std::{env, fs};

const PREFIX: &str = "PERIPHERAL_OBSERVER_";

struct ConfigItem {
    name: &'static str,
    default: usize,
    min: usize,
    max: usize,
}

static CONFIGS: &[ConfigItem] = &[
    ConfigItem {
        name: "LOCAL_ATTRIBUTES_MAX",
        default: 32,
        // Generic access and generic attribute entries.
        min: 5,
        max: u16::MAX as usize,
    },
    ConfigItem {
        name: "REMOTE_ATTRIBUTES_MAX",
        default: 16,
        min: 1,
        max: u16::MAX as usize,
    },
    ConfigItem {
        name: "ATTRIBUTE_VALUE_MAX",
        default: 20,
        min: 1,
        max: 512,
    },
    // Legacy advertising payload is 31 bytes; 3 go to flags, 2 to the record header.
    ConfigItem {
        name: "ADVERTISEMENT_DATA_MAX",
        default: 26,
        min: 1,
        max: 26,
    },
    // Scan response payload is 31 bytes; 2 go to the record header.
    ConfigItem {
        name: "SCAN_DATA_MAX",
        default: 29,
        min: 1,
        max: 29,
    },
];

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());

    let mut data = String::new();
    for item in CONFIGS {
        let var = format!("{}{}", PREFIX, item.name);
        println!("cargo:rerun-if-env-changed={}", var);

        let value = match env::var(&var) {
            Ok(raw) => raw
                .parse::<usize>()
                .unwrap_or_else(|_| panic!("{} must be an unsigned integer, got {:?}", var, raw)),
            Err(_) => item.default,
        };
        if value < item.min || value > item.max {
            panic!("{} must be in {}..={}, got {}", var, item.min, item.max, value);
        }

        writeln!(data, "pub const {}: usize = {};", item.name, value).unwrap();
    }

    fs::write(out_dir.join("config.rs"), data).unwrap();
    println!("cargo:rerun-if-changed=build.rs");
}
