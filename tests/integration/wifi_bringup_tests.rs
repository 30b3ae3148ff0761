//! Wi-Fi bring-up against a scripted ESP8266 on the serial link.

use alarmnode::app::commands::{AppCommand, CommandResponse};
use alarmnode::app::events::SystemEvent;
use alarmnode::wifi::states::WifiState;

use super::mock_hw::{ModuleSim, Node, wifi_node};

const JOIN: &str = "AT+CWJAP=\"lab\",\"secret\"";

fn wifi_states(node: &Node) -> Vec<WifiState> {
    node.sink
        .events
        .iter()
        .filter_map(|e| match e {
            SystemEvent::WifiStateChanged(s) => Some(*s),
            _ => None,
        })
        .collect()
}

fn comm_active(node: &Node) -> bool {
    node.app.wifi().is_some_and(|w| w.comm().is_active())
}

#[test]
fn booting_module_is_reset_then_joins_after_retries() {
    let mut node = wifi_node(ModuleSim {
        booting: true,
        join_failures: 2,
        ..ModuleSim::default()
    });

    node.run(40_000);

    assert_eq!(
        wifi_states(&node),
        vec![
            WifiState::ModuleDetect,
            WifiState::ModuleNotDetected,
            WifiState::ModuleInit,
            WifiState::CheckAPConnection,
            WifiState::ModuleNotConnected,
            WifiState::CommunicationInit,
            WifiState::CommunicationUpdate,
        ]
    );

    let sim = node.module.borrow();
    let commands: Vec<&str> = sim.writes.iter().map(|(_, c)| c.as_str()).collect();
    assert_eq!(
        commands,
        vec!["AT", "AT+RST", "AT+CWMODE=1", "AT+CIFSR", JOIN, JOIN, JOIN, "AT+CIFSR"]
    );

    // Reset only after a full backoff window.
    let reset_at = sim.writes_of("AT+RST")[0];
    assert!(reset_at >= 10_000, "reset sent at {reset_at} ms");

    // First join right away, then one per backoff window.
    let joins = sim.writes_of("AT+CWJAP");
    for pair in joins.windows(2) {
        let gap = pair[1] - pair[0];
        assert!((10_000..10_200).contains(&gap), "join retry gap {gap} ms");
    }
    drop(sim);

    let wifi = node.app.wifi().unwrap();
    assert_eq!(wifi.join_attempts(), 3);
    assert_eq!(wifi.last_join_error(), None);
    assert_eq!(wifi.ip().map(|ip| ip.as_str()), Some("192.168.1.9"));
    assert!(comm_active(&node));
    assert!(node.sink.saw("WIFI_COMMUNICATION_UPDATE"));
}

#[test]
fn associated_module_goes_straight_to_communication() {
    let mut node = wifi_node(ModuleSim {
        associated: true,
        ..ModuleSim::default()
    });
    node.run(200);

    assert_eq!(
        wifi_states(&node),
        vec![
            WifiState::ModuleDetect,
            WifiState::ModuleInit,
            WifiState::CheckAPConnection,
            WifiState::CommunicationInit,
            WifiState::CommunicationUpdate,
        ]
    );
    assert!(node.module.borrow().writes_of("AT+CWJAP").is_empty());

    let resp = node
        .app
        .handle_command(AppCommand::ReadWifiState, &mut node.sink);
    match resp {
        CommandResponse::Wifi { state, ip } => {
            assert_eq!(state, WifiState::CommunicationUpdate);
            assert_eq!(ip.as_deref(), Some("192.168.1.9"));
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[test]
fn link_supervision_detects_lost_association() {
    let mut node = wifi_node(ModuleSim {
        associated: true,
        ..ModuleSim::default()
    });
    node.run(200);
    assert!(comm_active(&node));

    node.module.borrow_mut().associated = false;
    node.sink.clear();
    node.run(30_500);

    let states = wifi_states(&node);
    assert_eq!(
        &states[..3],
        &[
            WifiState::CheckAPConnection,
            WifiState::ModuleNotConnected,
            WifiState::CommunicationInit,
        ]
    );
    // The immediate rejoin succeeds, so the link comes straight back.
    assert_eq!(node.app.wifi().unwrap().state(), WifiState::CommunicationUpdate);
    assert!(comm_active(&node));
}

#[test]
fn powered_off_module_falls_back_to_reset_loop() {
    let mut node = wifi_node(ModuleSim {
        associated: true,
        ..ModuleSim::default()
    });
    node.run(200);
    assert!(comm_active(&node));

    node.module.borrow_mut().silent = true;
    node.sink.clear();
    // Next link check at 30 s, answered by nothing within 1 s.
    node.run(32_000);
    assert_eq!(wifi_states(&node), vec![WifiState::ModuleNotDetected]);
    assert!(!comm_active(&node));
    assert_eq!(node.app.wifi().unwrap().ip(), None);

    // Resets keep going out once per backoff window.
    node.run(25_000);
    let resets = node.module.borrow().writes_of("AT+RST").len();
    assert_eq!(resets, 2);

    // Module comes back; the reset already in flight goes unanswered, the
    // next one brings it up.
    node.module.borrow_mut().silent = false;
    node.run(15_000);
    assert_eq!(node.app.wifi().unwrap().state(), WifiState::CommunicationUpdate);
    assert!(comm_active(&node));
}

#[test]
fn alarm_keeps_running_while_wifi_retries() {
    let mut node = wifi_node(ModuleSim {
        silent: true,
        ..ModuleSim::default()
    });
    node.board.borrow_mut().gas = true;
    node.run(1_000);
    node.board.borrow_mut().gas = false;
    assert!(node.app.alarm().is_active());

    node.keys("1805#");
    assert!(!node.app.alarm().is_active());
    assert_eq!(node.app.wifi().unwrap().state(), WifiState::ModuleNotDetected);
}

#[test]
fn refused_request_faults_and_bring_up_restarts_from_detection() {
    let mut node = wifi_node(ModuleSim {
        associated: true,
        ..ModuleSim::default()
    });
    node.run(200);
    assert!(comm_active(&node));

    // A stray exchange still holds the transport when the link check is due.
    node.app
        .wifi_mut()
        .unwrap()
        .module_mut()
        .at_mut()
        .start(b"AT+GMR\r\n", b"OK\r\n", u32::MAX)
        .unwrap();
    node.sink.clear();
    node.run(30_500);

    assert_eq!(
        wifi_states(&node),
        vec![
            WifiState::Fault,
            WifiState::ModuleDetect,
            WifiState::ModuleInit,
            WifiState::CheckAPConnection,
            WifiState::CommunicationInit,
            WifiState::CommunicationUpdate,
        ]
    );
    assert!(node.sink.saw("WIFI_FAULT"));

    let sim = node.module.borrow();
    let after_stray: Vec<&str> = sim
        .writes
        .iter()
        .map(|(_, c)| c.as_str())
        .skip_while(|c| *c != "AT+GMR")
        .skip(1)
        .collect();
    assert_eq!(after_stray, vec!["AT", "AT+CWMODE=1", "AT+CIFSR"]);
    drop(sim);

    assert_eq!(node.app.wifi().unwrap().ip().map(|ip| ip.as_str()), Some("192.168.1.9"));
    assert!(comm_active(&node));
}
