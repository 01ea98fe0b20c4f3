//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable, human-readable device ID in the form `IV-XXYYZZ`
//! (last 3 bytes of the 6-byte MAC in uppercase hex).  Deterministic
//! across reboots (factory-burned eFuse MAC); reported as `device_id` in
//! the heartbeat message and used as the MQTT client id.

/// Fixed-size device ID string: "IV-XXYYZZ".
pub type DeviceIdString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: esp_efuse_mac_get_default writes exactly 6 bytes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Derive the short device ID from the last 3 MAC bytes.
/// Format: `IV-XXYYZZ` (e.g., `IV-EFCAFE`).
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    use core::fmt::Write;
    let _ = write!(id, "IV-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_format() {
        let mac = [0x00, 0x11, 0x22, 0xAA, 0xBB, 0xCC];
        assert_eq!(device_id(&mac).as_str(), "IV-AABBCC");
    }

    #[test]
    fn device_id_is_deterministic() {
        let mac = read_mac();
        assert_eq!(device_id(&mac), device_id(&mac));
    }
}
