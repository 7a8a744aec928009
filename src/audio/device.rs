//! Device enumeration and the `"<index>: <name>"` config convention.
//!
//! `config.json` stores device choices as human-readable strings like
//! `"12: Microphone (Realtek)"` rather than opaque host IDs, so the list
//! stays meaningful if shown to a user. Resolution re-enumerates the live
//! device list and matches either the full `"N: Name"` form or a bare name,
//! silently falling back to the default device if nothing matches.

use cpal::traits::{DeviceTrait, HostTrait};

/// List input device names, in host enumeration order.
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.input_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// List output device names, in host enumeration order.
pub fn list_output_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Parse a config value like `"12: Microphone (Realtek)"` into just the
/// device name. Accepts a bare name too (no `": "` prefix).
fn strip_index_prefix(spec: &str) -> &str {
    match spec.split_once(": ") {
        Some((idx, name)) if idx.chars().all(|c| c.is_ascii_digit()) => name,
        _ => spec,
    }
}

/// Resolve a configured device spec against a live device list. Returns
/// `None` (not an error) if the device no longer exists — the loader
/// silently falls back to the platform default per the configuration
/// contract.
pub fn resolve_device_name(spec: &str, live_devices: &[String]) -> Option<String> {
    let wanted = strip_index_prefix(spec);
    live_devices.iter().find(|d| d.as_str() == wanted).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_numeric_prefix() {
        assert_eq!(strip_index_prefix("12: Microphone (Realtek)"), "Microphone (Realtek)");
    }

    #[test]
    fn leaves_bare_name_untouched() {
        assert_eq!(strip_index_prefix("Built-in Mic"), "Built-in Mic");
    }

    #[test]
    fn resolves_against_live_list() {
        let live = vec!["Built-in Mic".to_string(), "USB Headset".to_string()];
        assert_eq!(
            resolve_device_name("1: USB Headset", &live),
            Some("USB Headset".to_string())
        );
    }

    #[test]
    fn missing_device_resolves_to_none() {
        let live = vec!["Built-in Mic".to_string()];
        assert_eq!(resolve_device_name("5: Unplugged Mic", &live), None);
    }
}
