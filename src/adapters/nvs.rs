//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the system configuration (calibration table
//! included) lives as one postcard blob under the `intellivend` namespace.
//!
//! - Config validation: all fields are range-checked before persistence
//!   and after load, so a corrupted blob can never inject a zero or
//!   negative calibration factor.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - On first boot or after an NVS version mismatch the partition is
//!   erased and re-initialised automatically.

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "intellivend";
const CONFIG_KEY: &str = "syscfg";
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: RefCell::new(None),
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, buf: &mut [u8]) -> Result<usize, ConfigError> {
        let mut ns = [0u8; 16];
        ns[..CONFIG_NAMESPACE.len()].copy_from_slice(CONFIG_NAMESPACE.as_bytes());
        let mut key = [0u8; 16];
        key[..CONFIG_KEY.len()].copy_from_slice(CONFIG_KEY.as_bytes());

        let mut handle: nvs_handle_t = 0;
        // SAFETY: single main-task context; handle closed on every path.
        unsafe {
            if nvs_open(ns.as_ptr().cast(), nvs_open_mode_t_NVS_READONLY, &mut handle) != ESP_OK {
                return Err(ConfigError::NotFound);
            }
            let mut len = buf.len();
            let ret = nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut len);
            nvs_close(handle);
            match ret {
                ESP_OK => Ok(len),
                ESP_ERR_NVS_NOT_FOUND => Err(ConfigError::NotFound),
                _ => Err(ConfigError::IoError),
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, data: &[u8]) -> Result<(), ConfigError> {
        let mut ns = [0u8; 16];
        ns[..CONFIG_NAMESPACE.len()].copy_from_slice(CONFIG_NAMESPACE.as_bytes());
        let mut key = [0u8; 16];
        key[..CONFIG_KEY.len()].copy_from_slice(CONFIG_KEY.as_bytes());

        let mut handle: nvs_handle_t = 0;
        // SAFETY: single main-task context; handle closed on every path.
        unsafe {
            if nvs_open(ns.as_ptr().cast(), nvs_open_mode_t_NVS_READWRITE, &mut handle) != ESP_OK {
                return Err(ConfigError::IoError);
            }
            let ret = nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len());
            let commit = nvs_commit(handle);
            nvs_close(handle);
            if ret == ESP_OK && commit == ESP_OK {
                Ok(())
            } else {
                Err(ConfigError::IoError)
            }
        }
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(target_os = "espidf")]
        let config: SystemConfig = {
            let mut buf = [0u8; MAX_BLOB_SIZE];
            let len = self.read_blob(&mut buf)?;
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?
        };

        #[cfg(not(target_os = "espidf"))]
        let config: SystemConfig = {
            let store = self.store.borrow();
            let blob = store.as_ref().ok_or(ConfigError::NotFound)?;
            postcard::from_bytes(blob).map_err(|_| ConfigError::Corrupted)?
        };

        config.validate().map_err(ConfigError::ValidationFailed)?;
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let blob = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if blob.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::IoError);
        }

        #[cfg(target_os = "espidf")]
        self.write_blob(&blob)?;

        #[cfg(not(target_os = "espidf"))]
        {
            *self.store.borrow_mut() = Some(blob);
        }

        info!("NvsAdapter: config saved");
        Ok(())
    }
}
