//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements            | Connects to                  |
//! |-------------|-----------------------|------------------------------|
//! | `adc`       | AnalogSource          | ESP32 ADC1 one-shot (LM35)   |
//! | `comm`      | CommLayer             | Log output                   |
//! | `event_log` | EventSink             | In-memory ring, timestamped  |
//! | `hardware`  | SensorPort            | Gas input, temperature ADC   |
//! |             | InputPort             | Keypad matrix, enter button  |
//! |             | IndicatorPort         | Alarm / IC / SB LEDs         |
//! | `log_sink`  | EventSink             | Serial log output            |
//! | `nvs`       | ConfigPort            | NVS / in-memory store        |
//! | `time`      | TimePort              | ESP32 system timer           |
//! | `uart`      | SerialPort            | UART1 to the ESP8266         |

#[cfg(target_os = "espidf")]
pub mod adc;
pub mod comm;
pub mod event_log;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
