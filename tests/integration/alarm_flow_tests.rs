//! Alarm flows driven through real pins: sensors in, keypad and enter
//! button for disarm, LEDs and named events out.

use alarmnode::adapters::nvs::NvsAdapter;
use alarmnode::alarm::CodeCheck;
use alarmnode::alarm::code::CodeBuffer;
use alarmnode::app::commands::{AppCommand, CommandResponse};
use alarmnode::app::ports::ConfigPort;

use super::mock_hw::{LED_ALARM, LED_INCORRECT_CODE, LED_SYSTEM_BLOCKED, bare_node};

fn code(s: &str) -> CodeBuffer {
    CodeBuffer::parse(s).unwrap()
}

#[test]
fn gas_alarm_blinks_slowly_and_keypad_code_disarms() {
    let mut node = bare_node();
    node.board.borrow_mut().gas = true;
    node.run(50);
    assert!(node.app.alarm().is_active());
    assert!(node.sink.saw("ALARM_ON"));
    assert!(node.sink.saw("GAS_DET_ON"));

    let toggles = node.alarm_led_toggles(5_000);
    assert!((4..=5).contains(&toggles), "1 s blink, got {toggles} toggles");

    // Detector clears; the alarm stays latched.
    node.board.borrow_mut().gas = false;
    node.run(100);
    assert!(node.app.alarm().is_active());

    node.keys("1805#");
    node.run(20);
    assert!(!node.app.alarm().is_active());
    assert!(!node.led(LED_ALARM));
    assert!(node.sink.saw("ALARM_OFF"));
    assert!(node.sink.saw("GAS_DET_OFF"));
    assert_eq!(node.app.alarm().incorrect_attempts(), 0);
}

#[test]
fn enter_button_submits_the_typed_code() {
    let mut node = bare_node();
    node.board.borrow_mut().temperature_c = 60.0;
    node.run(200);
    assert!(node.sink.saw("OVER_TEMP_ON"));

    let toggles = node.alarm_led_toggles(5_000);
    assert!((9..=10).contains(&toggles), "500 ms blink, got {toggles} toggles");

    // Let the moving average fall back under the threshold.
    node.board.borrow_mut().temperature_c = 25.0;
    node.run(1_500);

    node.keys("1805");
    assert!(node.app.alarm().is_active());
    node.press_enter();
    assert!(!node.app.alarm().is_active());
    assert!(node.sink.saw("OVER_TEMP_OFF"));
}

#[test]
fn gas_and_over_temperature_blink_fastest() {
    let mut node = bare_node();
    {
        let mut b = node.board.borrow_mut();
        b.gas = true;
        b.temperature_c = 70.0;
    }
    node.run(200);
    let toggles = node.alarm_led_toggles(1_000);
    assert!((9..=10).contains(&toggles), "100 ms blink, got {toggles} toggles");
}

#[test]
fn quiet_node_keeps_every_led_off() {
    let mut node = bare_node();
    node.keys("1805#");
    node.run(2_000);
    assert!(!node.app.alarm().is_active());
    assert!(!node.led(LED_ALARM));
    assert!(!node.led(LED_INCORRECT_CODE));
    assert!(!node.led(LED_SYSTEM_BLOCKED));
    assert_eq!(node.sink.names(), vec!["SYSTEM_START"]);
}

#[test]
fn five_wrong_codes_lock_the_keypad_until_admin_reset() {
    let mut node = bare_node();
    node.board.borrow_mut().gas = true;
    node.run(50);
    node.board.borrow_mut().gas = false;

    for attempt in 1..=5u8 {
        node.keys("0000#");
        assert_eq!(node.app.alarm().incorrect_attempts(), attempt);
        assert!(node.led(LED_INCORRECT_CODE));
        if attempt < 5 {
            // Two presses of '#' acknowledge the incorrect code.
            node.keys("##");
            assert!(!node.led(LED_INCORRECT_CODE));
        }
    }
    assert!(node.app.alarm().locked_out());
    assert!(node.led(LED_SYSTEM_BLOCKED));
    assert!(node.sink.saw("LED_SB_ON"));

    node.keys("1805#");
    assert!(node.app.alarm().is_active(), "a locked keypad must not disarm");
    assert_eq!(node.app.alarm().incorrect_attempts(), 5);

    let resp = node.app.handle_command(AppCommand::AdminReset, &mut node.sink);
    assert_eq!(resp, CommandResponse::Done);
    assert!(node.sink.saw("LED_SB_OFF"));
    assert!(node.sink.saw("LED_IC_OFF"));

    node.keys("1805#");
    assert!(!node.app.alarm().is_active());
    assert!(!node.led(LED_SYSTEM_BLOCKED));
}

#[test]
fn console_reads_and_submits_through_accessors() {
    let mut node = bare_node();
    node.run(1_100);

    match node.app.handle_command(AppCommand::ReadTemperature, &mut node.sink) {
        CommandResponse::Temperature {
            celsius,
            fahrenheit,
        } => {
            assert!((celsius - 25.0).abs() < 0.1, "celsius {celsius}");
            assert!((fahrenheit - 77.0).abs() < 0.2, "fahrenheit {fahrenheit}");
        }
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(
        node.app.handle_command(AppCommand::ReadWifiState, &mut node.sink),
        CommandResponse::WifiAbsent
    );

    node.board.borrow_mut().gas = true;
    node.run(50);
    node.board.borrow_mut().gas = false;
    assert_eq!(
        node.app.handle_command(AppCommand::ReadGasDetector, &mut node.sink),
        CommandResponse::GasDetector(true)
    );

    let resp = node
        .app
        .handle_command(AppCommand::SubmitCode(code("1805")), &mut node.sink);
    assert_eq!(resp, CommandResponse::Code(CodeCheck::Accepted));
    assert_eq!(
        node.app.handle_command(AppCommand::ReadAlarm, &mut node.sink),
        CommandResponse::Alarm {
            active: false,
            locked_out: false
        }
    );
    assert!(node.sink.saw("ALARM_OFF"));
}

#[test]
fn written_code_takes_effect_and_is_persisted() {
    let mut node = bare_node();
    let nvs = NvsAdapter::new().unwrap();

    node.app
        .handle_command(AppCommand::WriteCode(code("4321")), &mut node.sink);
    assert!(node.app.is_config_dirty());
    assert!(!node.app.auto_save_if_needed(&nvs), "saved before the quiet period");

    node.run(5_000);
    assert!(node.app.auto_save_if_needed(&nvs));
    assert_eq!(nvs.load().unwrap().alarm_code.as_str(), "4321");

    node.board.borrow_mut().gas = true;
    node.run(50);
    node.board.borrow_mut().gas = false;
    node.keys("1805#");
    assert!(node.app.alarm().is_active(), "old code must be rejected");

    node.keys("##4321#");
    assert!(!node.app.alarm().is_active());
}
