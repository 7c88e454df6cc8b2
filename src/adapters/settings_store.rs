//! Settings store adapter.
//!
//! Implements [`SettingsStore`] on top of one postcard blob.
//!
//! - **`target_os = "espidf"`**: the blob lives in NVS under
//!   `irrigo::settings`.
//! - **`not(target_os = "espidf")`**: an in-memory blob, for host runs and
//!   tests.
//!
//! Saves are skipped when the encoded blob matches the last one written,
//! so the controller can call [`SettingsStore::save`] freely without
//! wearing out flash.

use log::info;

use crate::app::ports::SettingsStore;
use crate::config::SystemSettings;
use crate::error::{Error, Result};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const NAMESPACE: &[u8] = b"irrigo\0";
#[cfg(target_os = "espidf")]
const KEY: &[u8] = b"settings\0";
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

#[derive(Default)]
pub struct NvsSettingsStore {
    /// Last blob known to be in storage.
    last_written: Option<Vec<u8>>,
    writes: u32,
}

impl NvsSettingsStore {
    /// Open the store.  On ESP-IDF this initialises the NVS partition,
    /// erasing it if its layout is from an incompatible IDF version.
    pub fn new() -> Result<Self> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let mut ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                log::warn!("settings: erasing and re-initialising NVS partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(Error::Storage("nvs erase failed"));
                }
                ret = unsafe { nvs_flash_init() };
            }
            if ret != ESP_OK {
                return Err(Error::Storage("nvs init failed"));
            }
            info!("settings: NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("settings: in-memory backend");

        Ok(Self::default())
    }

    /// Flash writes actually performed.
    pub fn writes(&self) -> u32 {
        self.writes
    }

    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> core::result::Result<T, i32>,
    ) -> core::result::Result<T, i32> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>> {
        let result = Self::with_handle(false, |handle| {
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(handle, KEY.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                return Err(ret);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    KEY.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(Error::Storage("no settings stored")),
            Err(e) => {
                log::warn!("settings: NVS read error {}", e);
                Err(Error::Storage("nvs read failed"))
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Vec<u8>> {
        self.last_written
            .clone()
            .ok_or(Error::Storage("no settings stored"))
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        Self::with_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    KEY.as_ptr() as *const _,
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            log::warn!("settings: NVS write error {}", e);
            Error::Storage("nvs write failed")
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}

impl SettingsStore for NvsSettingsStore {
    fn load(&self) -> Result<SystemSettings> {
        let bytes = self.read_blob()?;
        let settings = SystemSettings::from_blob(&bytes)?;
        info!("settings: loaded ({} bytes)", bytes.len());
        Ok(settings)
    }

    fn save(&mut self, settings: &SystemSettings) -> Result<()> {
        settings.validate()?;
        let bytes = settings.to_blob()?;
        if self.last_written.as_deref() == Some(bytes.as_slice()) {
            return Ok(());
        }
        self.write_blob(&bytes)?;
        info!("settings: saved ({} bytes)", bytes.len());
        self.last_written = Some(bytes);
        self.writes += 1;
        Ok(())
    }
}
