//! Irrigo Firmware: Main Entry Point
//!
//! Cooperative super-loop around the irrigation [`Controller`].
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SpiBoard          LogTelemetrySink   NvsSettingsStore         │
//! │  (IoBoard)         (TelemetrySink)    (SettingsStore)          │
//! │  SystemClock                                                   │
//! │  (Clock)                                                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  Arbiter · Sensors · Zones · Scheduler · Loggers       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wall-clock synchronisation (SNTP) belongs to the network layer; until
//! it runs the scheduler stays quiet and only manual requests water.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use irrigo::adapters::board::SpiBoard;
use irrigo::adapters::log_sink::LogTelemetrySink;
use irrigo::adapters::settings_store::NvsSettingsStore;
use irrigo::adapters::time::SystemClock;
use irrigo::app::ports::SettingsStore;
use irrigo::app::service::Controller;
use irrigo::config::SystemSettings;
use irrigo::error::BoardError;
use irrigo::pins;

/// Super-loop period.  Well below the shortest state-machine delay
/// (the 10 ms sample spacing).
const LOOP_PERIOD_MS: u32 = 5;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Irrigo v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Actuator register on SPI2, latch as chip select ────
    // SAFETY: the pin numbers come from `pins` and are not claimed
    // anywhere else.
    let (sclk, mosi, latch, power) = unsafe {
        (
            AnyOutputPin::new(pins::REGISTER_SCLK_GPIO),
            AnyOutputPin::new(pins::REGISTER_MOSI_GPIO),
            AnyOutputPin::new(pins::REGISTER_LATCH_GPIO),
            AnyOutputPin::new(pins::SENSOR_POWER_GPIO),
        )
    };
    let spi = SpiDriver::new(
        peripherals.spi2,
        sclk,
        mosi,
        Option::<AnyIOPin>::None,
        &SpiDriverConfig::new(),
    )?;
    let register = SpiDeviceDriver::new(
        spi,
        Some(latch),
        &SpiConfig::new().baudrate(Hertz(pins::REGISTER_SPI_HZ)),
    )?;

    // ── 3. Sensor rail + probe input ──────────────────────────
    let mut power = PinDriver::output(power)?;
    power.set_low()?;

    let adc = AdcDriver::new(peripherals.adc1)?;
    let adc_config = AdcChannelConfig {
        attenuation: DB_11,
        ..Default::default()
    };
    let mut probe = AdcChannelDriver::new(adc, peripherals.pins.gpio5, &adc_config)?;
    info!("probe input on GPIO {}", pins::SENSOR_ADC_GPIO);
    // 12-bit conversions, scaled to the 10-bit range the probes are
    // calibrated for.
    let analog = move || {
        probe
            .read_raw()
            .map(|raw| raw >> 2)
            .map_err(|_| BoardError::AnalogRead)
    };

    let board = SpiBoard::new(register, power, analog);

    // ── 4. Settings ───────────────────────────────────────────
    let mut store = NvsSettingsStore::new()?;
    let settings = match store.load() {
        Ok(s) => s,
        Err(e) => {
            warn!("settings load failed ({}), using factory settings", e);
            SystemSettings::default()
        }
    };

    // ── 5. Controller ─────────────────────────────────────────
    let mut controller = Controller::new(board, settings);
    let clock = SystemClock::new();
    let mut sink = LogTelemetrySink::new();

    for zone in 0..irrigo::config::NUM_ZONES {
        if let Ok(status) = controller.zone_status(zone) {
            info!("\n{}", status);
        }
    }
    info!("mode: {}, entering main loop", controller.mode());

    // ── 6. Super-loop ─────────────────────────────────────────
    loop {
        controller.run(&clock, &mut sink);
        controller.sync_settings(&mut store);
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
