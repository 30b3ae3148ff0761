//! AlarmNode Firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        UartSerial     NvsAdapter   Esp32Time  │
//! │  (Sensor+Input+Leds)    (SerialPort)   (Config)     (TimePort) │
//! │  LogEventSink + EventLog (EventSink)   LoggingComm (CommLayer) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Keypad · Alarm FSM · Wi-Fi FSM · AT engine            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Fixed-period tick loop                                        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use log::{info, warn};

use alarmnode::adapters::adc::OneshotAdc;
use alarmnode::adapters::comm::LoggingComm;
use alarmnode::adapters::event_log::EventLog;
use alarmnode::adapters::hardware::HardwareAdapter;
use alarmnode::adapters::log_sink::{LogEventSink, Tee};
use alarmnode::adapters::nvs::NvsAdapter;
use alarmnode::adapters::time::Esp32TimeAdapter;
use alarmnode::adapters::uart::UartSerial;
use alarmnode::app::ports::ConfigPort;
use alarmnode::app::service::AppService;
use alarmnode::at::AtEngine;
use alarmnode::config::SystemConfig;
use alarmnode::drivers::debounce::DebouncedInput;
use alarmnode::drivers::indicators::IndicatorLeds;
use alarmnode::drivers::keypad::MatrixKeypad;
use alarmnode::error::Error;
use alarmnode::pins;
use alarmnode::sensors::SensorHub;
use alarmnode::sensors::gas::GasDetector;
use alarmnode::sensors::temperature::TemperatureSensor;
use alarmnode::wifi::WifiManager;
use alarmnode::wifi::context::WifiSettings;
use alarmnode::wifi::module::{AtTimeouts, WifiModule};

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type InPin = PinDriver<'static, AnyIOPin, Input>;

fn output(gpio: i32) -> Result<OutPin> {
    // SAFETY: each GPIO number in `pins` is claimed exactly once, here.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    Ok(PinDriver::output(pin)?)
}

fn pulled_up_input(gpio: i32) -> Result<InPin> {
    // SAFETY: as for `output`.
    let pin = unsafe { AnyIOPin::new(gpio) };
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Up)?;
    Ok(driver)
}

fn plain_input(gpio: i32) -> Result<InPin> {
    // SAFETY: as for `output`.
    let pin = unsafe { AnyIOPin::new(gpio) };
    Ok(PinDriver::input(pin)?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AlarmNode v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = match nvs.as_ref().map(|n| n.load()) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };

    // ── 3. Local I/O ──────────────────────────────────────────
    let rows = [
        output(pins::KEYPAD_ROW_GPIOS[0])?,
        output(pins::KEYPAD_ROW_GPIOS[1])?,
        output(pins::KEYPAD_ROW_GPIOS[2])?,
        output(pins::KEYPAD_ROW_GPIOS[3])?,
    ];
    let cols = [
        pulled_up_input(pins::KEYPAD_COL_GPIOS[0])?,
        pulled_up_input(pins::KEYPAD_COL_GPIOS[1])?,
        pulled_up_input(pins::KEYPAD_COL_GPIOS[2])?,
        pulled_up_input(pins::KEYPAD_COL_GPIOS[3])?,
    ];

    let adc = OneshotAdc::new(pins::TEMP_ADC_CHANNEL)
        .map_err(|_| Error::Init("temperature ADC"))?;
    let sensors = SensorHub::new(
        TemperatureSensor::new(adc, &config),
        GasDetector::new(plain_input(pins::GAS_DETECT_GPIO)?, false),
    );

    let mut hw = HardwareAdapter::new(
        sensors,
        MatrixKeypad::new(rows, cols),
        DebouncedInput::new(
            pulled_up_input(pins::ENTER_BUTTON_GPIO)?,
            true,
            config.debounce_ms,
        ),
        IndicatorLeds::new(
            output(pins::LED_ALARM_GPIO)?,
            output(pins::LED_INCORRECT_CODE_GPIO)?,
            output(pins::LED_SYSTEM_BLOCKED_GPIO)?,
        ),
    );

    // ── 4. Wi-Fi module link ──────────────────────────────────
    let uart = UartSerial::new(pins::WIFI_UART_BAUD).map_err(|_| Error::Init("wifi UART"))?;
    let module = WifiModule::new(
        AtEngine::new(uart, config.at_bytes_per_tick),
        AtTimeouts::from(&config),
    );
    let wifi = WifiManager::new(module, LoggingComm::new(), WifiSettings::from(&config));

    // ── 5. Application service ────────────────────────────────
    let time = Esp32TimeAdapter::new();
    let mut sink = Tee(LogEventSink::new(), EventLog::new(Esp32TimeAdapter::new()));
    let mut app = AppService::new(config.clone())?.with_wifi(wifi);
    app.start(&mut sink);

    info!("System ready. Entering tick loop.");

    // ── 6. Tick loop ──────────────────────────────────────────
    let period_ms = config.tick_period_ms;
    loop {
        let started_us = time.uptime_us();

        app.tick(&mut hw, &mut sink);

        // Config auto-save (5 s after the last change).
        if let Some(nvs) = nvs.as_ref() {
            app.auto_save_if_needed(nvs);
        }

        let spent_ms = ((time.uptime_us() - started_us) / 1_000) as u32;
        if spent_ms >= period_ms {
            warn!("tick overran: {} ms of {} ms", spent_ms, period_ms);
        }
        FreeRtos::delay_ms(period_ms.saturating_sub(spent_ms).max(1));
    }
}
