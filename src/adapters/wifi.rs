//! WiFi station-mode adapter.
//!
//! Connects the dispenser to the local network and exposes link health
//! (RSSI, IP address) for the heartbeat message.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation backend for host-side tests.
//!
//! ## Reconnection policy
//!
//! On link loss the adapter retries with exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s).  [`WifiAdapter::poll`] drives the retry from the
//! main loop; it never blocks longer than one connection attempt.

use core::fmt;
use log::{error, info, warn};

use crate::error::{CommsError, Error, Result};

#[cfg(target_os = "espidf")]
use esp_idf_hal::modem::Modem;
#[cfg(target_os = "espidf")]
use esp_idf_svc::eventloop::EspSystemEventLoop;
#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF_SECS: u64 = 2;
const MAX_BACKOFF_SECS: u64 = 60;

// ───────────────────────────────────────────────────────────────
// Credential validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<()> {
    let printable = ssid.bytes().all(|b| (0x20..=0x7E).contains(&b));
    if ssid.is_empty() || ssid.len() > 32 || !printable {
        return Err(Error::Config("SSID must be 1-32 printable ASCII bytes"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    // Empty password means an open network.
    if !password.is_empty() && (password.len() < 8 || password.len() > 64) {
        return Err(Error::Config("password must be 8-64 bytes for WPA2"));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_secs: u64,
    next_retry_at_ms: u64,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> Result<Self> {
        let esp_wifi =
            EspWifi::new(modem, sysloop.clone(), None).map_err(|_| CommsError::WifiConnectFailed)?;
        let driver = BlockingWifi::wrap(esp_wifi, sysloop)
            .map_err(|_| CommsError::WifiConnectFailed)?;
        Ok(Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            next_retry_at_ms: 0,
            last_rssi: None,
            driver,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self> {
        Ok(Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            next_retry_at_ms: 0,
            last_rssi: None,
            sim_connect_counter: 0,
        })
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<()> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|()| Error::Config("SSID too long"))?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| Error::Config("password too long"))?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Blocking connect with the stored credentials.
    pub fn connect(&mut self) -> Result<()> {
        if self.ssid.is_empty() {
            return Err(Error::Config("no WiFi credentials configured"));
        }
        if self.state == WifiState::Connected {
            return Ok(());
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connected;
                self.backoff_secs = INITIAL_BACKOFF_SECS;
                self.last_rssi = self.platform_rssi();
                info!("WiFi: connected (RSSI={:?} IP={})", self.last_rssi, self.ip_address());
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Reconnecting { attempt: 0 };
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    /// Drive reconnect and link-health refresh from the main loop.
    ///
    /// `now_ms` gates the backoff: a retry only fires once the current
    /// backoff window has elapsed.
    pub fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connected => {
                if self.platform_is_connected() {
                    self.last_rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: link lost, entering reconnect");
                    self.last_rssi = None;
                    self.state = WifiState::Reconnecting { attempt: 0 };
                    self.next_retry_at_ms = now_ms + self.backoff_secs * 1000;
                }
            }
            WifiState::Reconnecting { attempt } => {
                if now_ms < self.next_retry_at_ms {
                    return;
                }
                info!("WiFi: reconnect attempt {} (backoff {}s)", attempt + 1, self.backoff_secs);
                match self.platform_connect() {
                    Ok(()) => {
                        self.state = WifiState::Connected;
                        self.backoff_secs = INITIAL_BACKOFF_SECS;
                        self.last_rssi = self.platform_rssi();
                        info!("WiFi: reconnected (RSSI={:?})", self.last_rssi);
                    }
                    Err(_) => {
                        self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        self.next_retry_at_ms = now_ms + self.backoff_secs * 1000;
                        self.state = WifiState::Reconnecting { attempt: attempt + 1 };
                    }
                }
            }
            WifiState::Disconnected => {}
        }
    }

    /// Last observed signal strength, for the heartbeat.
    pub fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }

    /// Station IP as dotted-quad text, `0.0.0.0` while the link is down.
    pub fn ip_address(&self) -> heapless::String<16> {
        let mut out = heapless::String::new();
        let _ = fmt::Write::write_str(&mut out, &self.platform_ip());
        out
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<()> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client_config = ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|()| Error::Config("SSID too long"))?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|()| Error::Config("password too long"))?,
            auth_method,
            ..Default::default()
        };
        self.driver
            .set_configuration(&Configuration::Client(client_config))
            .map_err(|_| CommsError::WifiConnectFailed)?;
        self.driver.start().map_err(|_| CommsError::WifiConnectFailed)?;
        self.driver.connect().map_err(|_| CommsError::WifiConnectFailed)?;
        self.driver
            .wait_netif_up()
            .map_err(|_| CommsError::WifiConnectFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<()> {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        // Every 8th attempt fails, exercising the backoff path in tests.
        if self.sim_connect_counter % 8 == 5 {
            warn!("WiFi(sim): simulated connect failure");
            return Err(CommsError::WifiConnectFailed.into());
        }
        info!("WiFi(sim): connected to '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.driver.disconnect();
        let _ = self.driver.stop();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {}

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::{esp_wifi_sta_get_ap_info, wifi_ap_record_t, ESP_OK};
        let mut ap_info: wifi_ap_record_t = Default::default();
        // SAFETY: ap_info is a valid out-parameter for the driver call.
        if unsafe { esp_wifi_sta_get_ap_info(&mut ap_info) } == ESP_OK {
            Some(ap_info.rssi)
        } else {
            None
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        if self.state == WifiState::Connected {
            // Oscillate around -60 dBm for realistic sim telemetry.
            Some(-60_i8.saturating_add(((self.sim_connect_counter % 12) as i8) - 6))
        } else {
            None
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_ip(&self) -> std::string::String {
        self.driver
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map(|info| info.ip.to_string())
            .unwrap_or_else(|_| "0.0.0.0".into())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ip(&self) -> std::string::String {
        if self.state == WifiState::Connected {
            "192.168.1.77".into()
        } else {
            "0.0.0.0".into()
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
