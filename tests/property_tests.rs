//! Property tests for the input, protocol and alarm state machines.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use alarmnode::adapters::event_log::{EVENT_LOG_CAPACITY, EventLog};
use alarmnode::alarm::code::CodeBuffer;
use alarmnode::alarm::{Alarm, AlarmSettings, CodeCheck};
use alarmnode::app::events::{Element, SystemEvent};
use alarmnode::app::ports::{EventSink, TimePort};
use alarmnode::at::PatternMatcher;
use alarmnode::config::SystemConfig;
use alarmnode::drivers::debounce::{DebounceChannel, Edge};
use alarmnode::drivers::keypad::{KeyScanner, Keypad};
use alarmnode::sensors::SensorSnapshot;
use proptest::prelude::*;

const TICK: u32 = 10;
const THRESHOLD: u32 = 40;
/// Longest bounce train that still fits inside one threshold window.
const MAX_BOUNCE_TICKS: usize = (THRESHOLD / TICK) as usize - 1;

// ── Debounce: chatter never splits a press ────────────────────

#[derive(Debug, Clone)]
struct PressCycle {
    press_bounce: Vec<bool>,
    hold_ticks: usize,
    release_bounce: Vec<bool>,
    idle_ticks: usize,
}

fn arb_cycle() -> impl Strategy<Value = PressCycle> {
    let bounce = proptest::collection::vec(any::<bool>(), 0..=MAX_BOUNCE_TICKS);
    (bounce.clone(), 4usize..30, bounce, 4usize..30).prop_map(
        |(press_bounce, hold_ticks, release_bounce, idle_ticks)| PressCycle {
            press_bounce,
            hold_ticks,
            release_bounce,
            idle_ticks,
        },
    )
}

fn raw_levels(cycles: &[PressCycle]) -> Vec<bool> {
    let mut levels = Vec::new();
    for c in cycles {
        levels.extend(&c.press_bounce);
        levels.extend(std::iter::repeat_n(true, c.hold_ticks));
        levels.extend(&c.release_bounce);
        levels.extend(std::iter::repeat_n(false, c.idle_ticks));
    }
    levels
}

proptest! {
    /// Bounce shorter than the threshold yields exactly one press and one
    /// release per physical cycle.
    #[test]
    fn chatter_yields_one_edge_pair_per_cycle(
        cycles in proptest::collection::vec(arb_cycle(), 1..8),
    ) {
        let mut ch = DebounceChannel::new(false, THRESHOLD).with_press_events();
        let edges: Vec<Edge> = raw_levels(&cycles)
            .into_iter()
            .filter_map(|level| ch.update(level, TICK))
            .collect();

        let presses = edges.iter().filter(|e| **e == Edge::Pressed).count();
        let releases = edges.iter().filter(|e| **e == Edge::Released).count();
        prop_assert_eq!(presses, cycles.len());
        prop_assert_eq!(releases, cycles.len());
    }

    /// Sub-threshold glitches on an idle line never produce an edge.
    #[test]
    fn isolated_glitches_are_absorbed(
        gaps in proptest::collection::vec((1usize..=MAX_BOUNCE_TICKS, 4usize..20), 1..20),
    ) {
        let mut ch = DebounceChannel::new(false, THRESHOLD);
        for (glitch, quiet) in gaps {
            for _ in 0..glitch {
                prop_assert_eq!(ch.update(true, TICK), None);
            }
            for _ in 0..quiet {
                prop_assert_eq!(ch.update(false, TICK), None);
            }
        }
    }
}

// ── Keypad: one report per hold ───────────────────────────────

struct Finger(Option<char>);

impl KeyScanner for Finger {
    fn scan(&mut self) -> Option<char> {
        self.0
    }
}

proptest! {
    #[test]
    fn each_hold_reports_its_key_once_on_release(
        presses in proptest::collection::vec(
            (proptest::sample::select(vec!['1', '5', '9', '0', '#', '*', 'A', 'D']), 5usize..40, 1usize..10),
            1..10,
        ),
    ) {
        let mut kp = Keypad::new(THRESHOLD);
        let mut finger = Finger(None);
        let mut reported = Vec::new();
        for (key, hold, gap) in &presses {
            finger.0 = Some(*key);
            for _ in 0..*hold {
                prop_assert_eq!(kp.update(&mut finger, TICK), None);
            }
            finger.0 = None;
            for _ in 0..*gap {
                reported.extend(kp.update(&mut finger, TICK));
            }
        }
        let expected: Vec<char> = presses.iter().map(|(k, _, _)| *k).collect();
        prop_assert_eq!(reported, expected);
    }
}

// ── AT pattern matcher ────────────────────────────────────────

proptest! {
    /// Every completion ends a contiguous copy of the pattern, and a copy
    /// that follows a byte foreign to the pattern always completes.
    #[test]
    fn matcher_fires_only_on_whole_runs(
        noise in proptest::collection::vec(
            proptest::sample::select(b"OKK\r\n ERx".to_vec()),
            0..64,
        ),
        append in any::<bool>(),
    ) {
        let pattern = b"OK\r\n";
        let mut stream = noise.clone();
        if append {
            stream.push(b' ');
            stream.extend_from_slice(pattern);
        }

        let mut m = PatternMatcher::new(pattern).unwrap();
        let fired: Vec<usize> = stream
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| m.feed(b).then_some(i + 1))
            .collect();
        for &end in &fired {
            prop_assert_eq!(&stream[end - pattern.len()..end], &pattern[..]);
        }
        if append {
            prop_assert_eq!(fired.last().copied(), Some(stream.len()));
        }
    }

    /// A pattern with any one byte corrupted never matches.
    #[test]
    fn corrupted_reply_never_matches(index in 0usize..4, bad in any::<u8>()) {
        let pattern = b"OK\r\n";
        prop_assume!(!pattern.contains(&bad));
        let mut reply = pattern.to_vec();
        reply[index] = bad;

        let mut m = PatternMatcher::new(pattern).unwrap();
        prop_assert!(!reply.iter().any(|&b| m.feed(b)));
    }
}

// ── Alarm: counting and lockout ───────────────────────────────

fn triggered_alarm() -> Alarm {
    let cfg = SystemConfig::default();
    let mut alarm = Alarm::new(
        CodeBuffer::parse(&cfg.alarm_code).unwrap(),
        AlarmSettings::from(&cfg),
    );
    let gas = SensorSnapshot {
        gas_detected: true,
        ..SensorSnapshot::default()
    };
    alarm.update(&gas, None, TICK);
    alarm
}

fn wrong_code() -> impl Strategy<Value = CodeBuffer> {
    "[0-9]{4}"
        .prop_filter("must differ from the stored code", |s| s != "1805")
        .prop_map(|s| CodeBuffer::parse(&s).unwrap())
}

proptest! {
    /// Attempts count up to the limit, lock, and then stop counting.
    #[test]
    fn wrong_codes_lock_out_at_five(
        codes in proptest::collection::vec(wrong_code(), 1..12),
    ) {
        let mut alarm = triggered_alarm();
        for (i, code) in codes.iter().enumerate() {
            let result = alarm.submit_code(code);
            let n = i + 1;
            match n {
                1..=4 => prop_assert_eq!(result, CodeCheck::Rejected { attempts: n as u8 }),
                5 => prop_assert_eq!(result, CodeCheck::LockedOut),
                _ => prop_assert_eq!(result, CodeCheck::Ignored),
            }
        }
        prop_assert_eq!(alarm.locked_out(), codes.len() >= 5);
        prop_assert_eq!(alarm.incorrect_attempts() as usize, codes.len().min(5));

        let correct = CodeBuffer::parse("1805").unwrap();
        let expected = if codes.len() >= 5 { CodeCheck::Ignored } else { CodeCheck::Accepted };
        prop_assert_eq!(alarm.submit_code(&correct), expected);
        prop_assert_eq!(alarm.is_active(), codes.len() >= 5);
    }

    /// The correct code before lockout always disarms and clears the count.
    #[test]
    fn correct_code_before_lockout_disarms(
        codes in proptest::collection::vec(wrong_code(), 0..5),
    ) {
        let mut alarm = triggered_alarm();
        for code in &codes {
            let _ = alarm.submit_code(code);
        }
        let correct = CodeBuffer::parse("1805").unwrap();
        prop_assert_eq!(alarm.submit_code(&correct), CodeCheck::Accepted);
        prop_assert!(!alarm.is_active());
        prop_assert_eq!(alarm.incorrect_attempts(), 0);
    }
}

// ── Event log ring ────────────────────────────────────────────

struct Clock;

impl TimePort for Clock {
    fn uptime_ms(&self) -> u64 {
        0
    }
}

proptest! {
    #[test]
    fn event_log_keeps_the_newest_entries(n in 0usize..300) {
        let mut log = EventLog::new(Clock);
        for i in 0..n {
            log.notify(&SystemEvent::ElementChanged {
                element: Element::Alarm,
                on: i % 2 == 0,
            });
        }
        prop_assert_eq!(log.len(), n.min(EVENT_LOG_CAPACITY));
        prop_assert_eq!(log.dropped() as usize, n.saturating_sub(EVENT_LOG_CAPACITY));
        if n > 0 {
            let last_on = (n - 1) % 2 == 0;
            prop_assert_eq!(
                log.latest().map(|e| e.event),
                Some(SystemEvent::ElementChanged { element: Element::Alarm, on: last_on })
            );
        }
    }
}
