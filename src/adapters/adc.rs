//! One-shot ADC1 channel feeding the LM35 temperature sensor.

use esp_idf_svc::sys::*;
use log::info;

use crate::sensors::temperature::AnalogSource;

/// Full-scale count at 12-bit width.
const ADC_MAX: f32 = 4095.0;

pub struct OneshotAdc {
    unit: adc_oneshot_unit_handle_t,
    channel: adc_channel_t,
}

impl OneshotAdc {
    /// Create ADC1 and configure `channel` for 12 dB attenuation, 12-bit.
    pub fn new(channel: adc_channel_t) -> Result<Self, i32> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut unit: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: called once from main; `unit` is an out-param.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut unit) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: `unit` was created above.
        let ret = unsafe { adc_oneshot_config_channel(unit, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        info!("adc: ADC1 channel {} configured", channel);
        Ok(Self { unit, channel })
    }
}

impl AnalogSource for OneshotAdc {
    fn read_normalised(&mut self) -> Option<f32> {
        let mut raw: i32 = 0;
        // SAFETY: `unit` is valid for the adapter's lifetime; main-loop only.
        let ret = unsafe { adc_oneshot_read(self.unit, self.channel, &mut raw) };
        if ret != ESP_OK as i32 {
            return None;
        }
        Some(raw.clamp(0, ADC_MAX as i32) as f32 / ADC_MAX)
    }
}
