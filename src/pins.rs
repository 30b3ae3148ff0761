//! GPIO / peripheral pin assignments for the alarm node board.
//!
//! Single source of truth: `main` builds every driver from these numbers
//! rather than hard-coding pins.

// ---------------------------------------------------------------------------
// 4×4 keypad matrix
// ---------------------------------------------------------------------------

/// Row drive lines R0..R3 (push-pull outputs, idle high).
pub const KEYPAD_ROW_GPIOS: [i32; 4] = [4, 5, 6, 7];
/// Column sense lines C0..C3 (inputs with pull-ups).
pub const KEYPAD_COL_GPIOS: [i32; 4] = [15, 16, 17, 18];

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

/// Momentary "enter" push-button, active-low with pull-up.  Acts as `#`.
pub const ENTER_BUTTON_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Gas detector comparator output.  HIGH = gas present.
pub const GAS_DETECT_GPIO: i32 = 9;

/// LM35 output, ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const TEMP_ADC_GPIO: i32 = 1;
/// ADC1 channel number matching [`TEMP_ADC_GPIO`].
pub const TEMP_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Indicator LEDs (active high)
// ---------------------------------------------------------------------------

pub const LED_ALARM_GPIO: i32 = 11;
pub const LED_INCORRECT_CODE_GPIO: i32 = 12;
pub const LED_SYSTEM_BLOCKED_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// UART1 to the ESP8266 AT module
// ---------------------------------------------------------------------------

pub const WIFI_UART_TX_GPIO: i32 = 39;
pub const WIFI_UART_RX_GPIO: i32 = 40;
/// Factory default baud rate of ESP-01 modules.
pub const WIFI_UART_BAUD: u32 = 115_200;
