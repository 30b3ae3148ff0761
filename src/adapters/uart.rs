//! UART link to the ESP8266 AT-command module.
//!
//! Raw ESP-IDF UART driver calls.  Reads never block (zero tick timeout);
//! writes are copied into the driver's TX ring and drained by the ISR.

use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::SerialPort;
use crate::pins;

const RX_RING_SIZE: i32 = 512;
const TX_RING_SIZE: i32 = 256;

pub struct UartSerial {
    port: uart_port_t,
}

impl UartSerial {
    /// Install the driver on `UART1` at `baud`, 8N1, no flow control.
    pub fn new(baud: u32) -> Result<Self, i32> {
        let port: uart_port_t = 1;
        let cfg = uart_config_t {
            baud_rate: baud as i32,
            data_bits: uart_word_length_t_UART_DATA_8_BITS,
            parity: uart_parity_t_UART_PARITY_DISABLE,
            stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
            flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
            ..Default::default()
        };

        // SAFETY: called once from main before the tick loop; the port is
        // owned by this adapter for the lifetime of the program.
        unsafe {
            let ret = uart_param_config(port, &cfg);
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = uart_set_pin(
                port,
                pins::WIFI_UART_TX_GPIO,
                pins::WIFI_UART_RX_GPIO,
                UART_PIN_NO_CHANGE,
                UART_PIN_NO_CHANGE,
            );
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = uart_driver_install(
                port,
                RX_RING_SIZE,
                TX_RING_SIZE,
                0,
                core::ptr::null_mut(),
                0,
            );
            if ret != ESP_OK {
                return Err(ret);
            }
        }

        info!("uart: UART{} ready at {} baud", port, baud);
        Ok(Self { port })
    }
}

impl SerialPort for UartSerial {
    fn try_read_byte(&mut self) -> Option<u8> {
        let mut byte = 0u8;
        // SAFETY: one-byte buffer, zero ticks to wait.
        let n = unsafe { uart_read_bytes(self.port, (&raw mut byte).cast(), 1, 0) };
        (n == 1).then_some(byte)
    }

    fn write(&mut self, bytes: &[u8]) {
        // SAFETY: `bytes` outlives the call; the driver copies into its ring.
        let n = unsafe { uart_write_bytes(self.port, bytes.as_ptr().cast(), bytes.len()) };
        if n < 0 || n as usize != bytes.len() {
            warn!("uart: short write ({} of {} bytes)", n, bytes.len());
        }
    }
}
