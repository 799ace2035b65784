//! Bakes the firmware configuration into the binary.
//!
//! Values come from the environment, or from a `.env` file next to
//! `Cargo.toml`, and fall back to the defaults below.

use std::env;
use std::fs;
use std::path::PathBuf;

const SETTINGS: [(&str, &str); 3] = [
    // Length of the double reset detection window
    ("DOUBLE_RESET_TIMEOUT_MS", "5000"),
    // How long reconfiguration mode runs before falling back to normal boot
    ("RECONFIGURE_WINDOW_SECS", "60"),
    // Status LED wiring: "true" when the LED lights with the pin low
    ("STATUS_LED_ACTIVE_LOW", "false"),
];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    for (name, _) in SETTINGS {
        println!("cargo:rerun-if-env-changed={name}");
    }

    // A missing .env is fine, everything has a default
    let _ = dotenvy::dotenv();

    let value = |name: &str, default: &str| env::var(name).unwrap_or_else(|_| default.to_string());

    let timeout_ms: u64 = value(SETTINGS[0].0, SETTINGS[0].1)
        .parse()
        .expect("DOUBLE_RESET_TIMEOUT_MS must be a number of milliseconds");
    let reconfigure_secs: u64 = value(SETTINGS[1].0, SETTINGS[1].1)
        .parse()
        .expect("RECONFIGURE_WINDOW_SECS must be a number of seconds");
    let active_low: bool = value(SETTINGS[2].0, SETTINGS[2].1)
        .parse()
        .expect("STATUS_LED_ACTIVE_LOW must be true or false");

    let generated = format!(
        "pub const DOUBLE_RESET_TIMEOUT_MS: u64 = {timeout_ms};\n\
         pub const RECONFIGURE_WINDOW_SECS: u64 = {reconfigure_secs};\n\
         pub const STATUS_LED_ACTIVE_LOW: bool = {active_low};\n"
    );

    let out = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out.join("build_config.rs"), generated).expect("failed to write build_config.rs");

    // esp-hal linker scripts
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
