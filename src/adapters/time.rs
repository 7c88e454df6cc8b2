//! System clock adapter.
//!
//! Implements [`Clock`] for the controller.
//!
//! - **`target_os = "espidf"`**: monotonic time from `esp_timer_get_time()`,
//!   local wall time from `gettimeofday()` + `localtime_r()` (the time zone
//!   comes from `TZ`, set by the firmware at boot).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for monotonic
//!   time and UTC wall time from `SystemTime`, for host-side runs.

use crate::app::ports::{Clock, WallTime};

/// Anything before 2020-01-01 means SNTP has not synchronised yet.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[cfg(target_os = "espidf")]
    fn wall_time(&self) -> Option<WallTime> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        if !(0..=6).contains(&tm.tm_wday) || !(0..=23).contains(&tm.tm_hour) {
            return None;
        }
        Some(WallTime {
            day: tm.tm_wday as u8,
            hour: tm.tm_hour as u8,
            minute: tm.tm_min as u8,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_time(&self) -> Option<WallTime> {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_secs();
        wall_time_from_unix(i64::try_from(secs).ok()?)
    }
}

/// UTC wall time of a Unix timestamp.  `None` before 2020.
pub fn wall_time_from_unix(secs: i64) -> Option<WallTime> {
    if secs < EPOCH_2020 {
        return None;
    }
    let at = time::OffsetDateTime::from_unix_timestamp(secs).ok()?;
    Some(WallTime {
        day: at.weekday().number_days_from_sunday(),
        hour: at.hour(),
        minute: at.minute(),
    })
}
