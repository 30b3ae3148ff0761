//! Mock board for integration tests.
//!
//! A shared [`Board`] models the physical world: which key is pressed,
//! the gas line, the enter button, the LM35 temperature and the LED
//! levels.  Pin mocks implement the embedded-hal traits on top of it, so
//! the real [`HardwareAdapter`], keypad scanner and debouncers run
//! unchanged.  [`ScriptedModule`] plays the ESP8266 on the serial link.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use alarmnode::adapters::comm::LoggingComm;
use alarmnode::adapters::hardware::HardwareAdapter;
use alarmnode::app::events::SystemEvent;
use alarmnode::app::ports::{EventSink, SerialPort};
use alarmnode::app::service::AppService;
use alarmnode::at::AtEngine;
use alarmnode::config::{SystemConfig, bounded};
use alarmnode::drivers::debounce::DebouncedInput;
use alarmnode::drivers::indicators::IndicatorLeds;
use alarmnode::drivers::keypad::{KEY_MAP, MatrixKeypad};
use alarmnode::sensors::SensorHub;
use alarmnode::sensors::gas::GasDetector;
use alarmnode::sensors::temperature::{AnalogSource, TemperatureSensor};
use alarmnode::wifi::WifiManager;
use alarmnode::wifi::context::WifiSettings;
use alarmnode::wifi::module::{AtTimeouts, WifiModule};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

pub const TICK_MS: u32 = 10;

// ── Board ─────────────────────────────────────────────────────

pub const LED_ALARM: usize = 0;
pub const LED_INCORRECT_CODE: usize = 1;
pub const LED_SYSTEM_BLOCKED: usize = 2;

#[derive(Debug)]
pub struct Board {
    /// (row, column) of the key under the finger.
    pub pressed: Option<(usize, usize)>,
    driven_low: [bool; 4],
    pub gas: bool,
    pub enter_down: bool,
    pub temperature_c: f32,
    pub leds: [bool; 3],
}

impl Default for Board {
    fn default() -> Self {
        Self {
            pressed: None,
            driven_low: [false; 4],
            gas: false,
            enter_down: false,
            temperature_c: 25.0,
            leds: [false; 3],
        }
    }
}

impl Board {
    pub fn press(&mut self, key: char) {
        self.pressed = KEY_MAP.iter().enumerate().find_map(|(r, row)| {
            row.iter().position(|&k| k == key).map(|c| (r, c))
        });
        assert!(self.pressed.is_some(), "no key {key:?} on the keypad");
    }

    pub fn release(&mut self) {
        self.pressed = None;
    }
}

pub type SharedBoard = Rc<RefCell<Board>>;

// ── Pins ──────────────────────────────────────────────────────

pub struct RowPin {
    board: SharedBoard,
    row: usize,
}

impl ErrorType for RowPin {
    type Error = Infallible;
}

impl OutputPin for RowPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.board.borrow_mut().driven_low[self.row] = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.board.borrow_mut().driven_low[self.row] = false;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Line {
    Column(usize),
    Gas,
    Enter,
}

/// Any board input: keypad column, gas comparator or enter button.
pub struct SensePin {
    board: SharedBoard,
    line: Line,
}

impl SensePin {
    fn level(&self) -> bool {
        let b = self.board.borrow();
        match self.line {
            // Pulled up; low only while the pressed key's row is driven low.
            Line::Column(col) => !matches!(b.pressed, Some((r, c)) if c == col && b.driven_low[r]),
            Line::Gas => b.gas,
            // Active low with pull-up.
            Line::Enter => !b.enter_down,
        }
    }
}

impl ErrorType for SensePin {
    type Error = Infallible;
}

impl InputPin for SensePin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

pub struct LedPin {
    board: SharedBoard,
    index: usize,
}

impl ErrorType for LedPin {
    type Error = Infallible;
}

impl OutputPin for LedPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.board.borrow_mut().leds[self.index] = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.board.borrow_mut().leds[self.index] = true;
        Ok(())
    }
}

/// LM35 on a 3.3 V ADC.
pub struct ThermalAdc {
    board: SharedBoard,
}

impl AnalogSource for ThermalAdc {
    fn read_normalised(&mut self) -> Option<f32> {
        Some(self.board.borrow().temperature_c * 0.01 / 3.3)
    }
}

pub type MockHardware = HardwareAdapter<ThermalAdc, SensePin, RowPin, SensePin, SensePin, LedPin>;

pub fn mock_hardware(cfg: &SystemConfig) -> (MockHardware, SharedBoard) {
    let board = SharedBoard::default();
    let sense = |line| SensePin {
        board: board.clone(),
        line,
    };
    let led = |index| LedPin {
        board: board.clone(),
        index,
    };

    let rows = [0, 1, 2, 3].map(|row| RowPin {
        board: board.clone(),
        row,
    });
    let cols = [0, 1, 2, 3].map(|c| sense(Line::Column(c)));

    let sensors = SensorHub::new(
        TemperatureSensor::new(
            ThermalAdc {
                board: board.clone(),
            },
            cfg,
        ),
        GasDetector::new(sense(Line::Gas), false),
    );
    let hw = HardwareAdapter::new(
        sensors,
        MatrixKeypad::new(rows, cols),
        DebouncedInput::new(sense(Line::Enter), true, cfg.debounce_ms),
        IndicatorLeds::new(
            led(LED_ALARM),
            led(LED_INCORRECT_CODE),
            led(LED_SYSTEM_BLOCKED),
        ),
    );
    (hw, board)
}

// ── Scripted ESP8266 ──────────────────────────────────────────

/// Behaviour of the simulated module.  Replies are queued as soon as a
/// command is written.
#[derive(Debug, Default)]
pub struct ModuleSim {
    /// Ignores everything except `AT+RST` until reset.
    pub booting: bool,
    /// Ignores everything (powered off).
    pub silent: bool,
    pub associated: bool,
    /// Joins that fail with `+CWJAP:3` before one succeeds.
    pub join_failures: u32,
    /// Set by the test loop; stamps recorded writes.
    pub now_ms: u32,
    /// `(time, command without CRLF)` for every write.
    pub writes: Vec<(u32, String)>,
    pub(crate) rx: VecDeque<u8>,
}

impl ModuleSim {
    pub fn writes_of(&self, prefix: &str) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|(_, cmd)| cmd.starts_with(prefix))
            .map(|(t, _)| *t)
            .collect()
    }
}

pub struct ScriptedModule(pub Rc<RefCell<ModuleSim>>);

impl SerialPort for ScriptedModule {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.0.borrow_mut().rx.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut sim = self.0.borrow_mut();
        let cmd = String::from_utf8_lossy(bytes).trim_end().to_string();
        let now = sim.now_ms;
        sim.writes.push((now, cmd.clone()));
        if sim.silent {
            return;
        }

        let reply: &[u8] = if cmd.starts_with("AT+RST") {
            sim.booting = false;
            b"OK\r\n\r\nready\r\n"
        } else if sim.booting {
            b""
        } else if cmd.starts_with("AT+CIFSR") {
            if sim.associated {
                b"+CIFSR:STAIP,\"192.168.1.9\"\r\n+CIFSR:STAMAC,\"5c:cf:7f:00:00:01\"\r\nOK\r\n"
            } else {
                b"+CIFSR:STAIP,\"0.0.0.0\"\r\nOK\r\n"
            }
        } else if cmd.starts_with("AT+CWJAP") {
            if sim.join_failures > 0 {
                sim.join_failures -= 1;
                b"+CWJAP:3\r\n\r\nFAIL\r\n"
            } else {
                sim.associated = true;
                b"WIFI CONNECTED\r\nWIFI GOT IP\r\n\r\nOK\r\n"
            }
        } else {
            b"OK\r\n"
        };
        sim.rx.extend(reply);
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SystemEvent>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(SystemEvent::name).collect()
    }

    pub fn saw(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name() == name)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn notify(&mut self, event: &SystemEvent) {
        self.events.push(*event);
    }
}

// ── Assembled node ────────────────────────────────────────────

pub type App = AppService<ScriptedModule, LoggingComm>;

pub struct Node {
    pub app: App,
    pub hw: MockHardware,
    pub board: SharedBoard,
    pub module: Rc<RefCell<ModuleSim>>,
    pub sink: RecordingSink,
    pub now_ms: u32,
}

pub fn config() -> SystemConfig {
    SystemConfig {
        wifi_ssid: bounded("lab"),
        wifi_password: bounded("secret"),
        ..SystemConfig::default()
    }
}

/// Node without a Wi-Fi module.
pub fn bare_node() -> Node {
    let cfg = config();
    let (hw, board) = mock_hardware(&cfg);
    let mut app = App::new(cfg).unwrap();
    let mut sink = RecordingSink::default();
    app.start(&mut sink);
    Node {
        app,
        hw,
        board,
        module: Rc::default(),
        sink,
        now_ms: 0,
    }
}

/// Node with a scripted module on the serial link.
pub fn wifi_node(sim: ModuleSim) -> Node {
    let cfg = config();
    let (hw, board) = mock_hardware(&cfg);
    let module = Rc::new(RefCell::new(sim));
    let wifi = WifiManager::new(
        WifiModule::new(
            AtEngine::new(ScriptedModule(module.clone()), cfg.at_bytes_per_tick),
            AtTimeouts::from(&cfg),
        ),
        LoggingComm::new(),
        WifiSettings::from(&cfg),
    );
    let mut app = App::new(cfg).unwrap().with_wifi(wifi);
    let mut sink = RecordingSink::default();
    app.start(&mut sink);
    Node {
        app,
        hw,
        board,
        module,
        sink,
        now_ms: 0,
    }
}

impl Node {
    pub fn tick(&mut self) {
        self.now_ms += TICK_MS;
        self.module.borrow_mut().now_ms = self.now_ms;
        self.app.tick(&mut self.hw, &mut self.sink);
    }

    pub fn run(&mut self, ms: u32) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    /// Press and release one key, 100 ms each way.
    pub fn key(&mut self, key: char) {
        self.board.borrow_mut().press(key);
        self.run(100);
        self.board.borrow_mut().release();
        self.run(100);
    }

    pub fn keys(&mut self, keys: &str) {
        for k in keys.chars() {
            self.key(k);
        }
    }

    pub fn press_enter(&mut self) {
        self.board.borrow_mut().enter_down = true;
        self.run(100);
        self.board.borrow_mut().enter_down = false;
        self.run(100);
    }

    pub fn led(&self, index: usize) -> bool {
        self.board.borrow().leds[index]
    }

    /// Count alarm-LED level changes over `ms`.
    pub fn alarm_led_toggles(&mut self, ms: u32) -> u32 {
        let mut last = self.led(LED_ALARM);
        let mut toggles = 0;
        for _ in 0..ms / TICK_MS {
            self.tick();
            let now = self.led(LED_ALARM);
            if now != last {
                toggles += 1;
                last = now;
            }
        }
        toggles
    }
}
