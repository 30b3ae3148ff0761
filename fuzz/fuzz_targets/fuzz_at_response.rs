//! Fuzz target: AT reply handling
//!
//! Drives arbitrary module output through the pattern matcher and the
//! reply parsers used by the Wi-Fi bring-up, asserting that none of them
//! panic and that an extracted station address is a well-formed quad.
//!
//! cargo fuzz run fuzz_at_response

#![no_main]

use alarmnode::at::{Exchange, ExchangeStatus};
use alarmnode::wifi::module::{parse_join_failure, parse_station_ip};
use libfuzzer_sys::fuzz_target;

const REPLIES: [&[u8]; 3] = [b"OK\r\n", b"ERROR\r\n", b"FAIL\r\n"];

fuzz_target!(|data: &[u8]| {
    if let Some(ip) = parse_station_ip(data) {
        assert!(ip.len() >= 7 && ip.len() <= 15, "address length out of range");
        assert_eq!(ip.split('.').count(), 4, "address is not a dotted quad");
        assert_ne!(ip.as_str(), "0.0.0.0");
    }
    let _ = parse_join_failure(data);

    // One millisecond per byte.
    let Ok(mut exchange) = Exchange::new(&REPLIES, 64) else {
        return;
    };
    for &byte in data {
        match exchange.poll(Some(byte), 1) {
            ExchangeStatus::Pending => {}
            ExchangeStatus::Matched { pattern } => {
                assert!(pattern < REPLIES.len(), "matched index out of range");
                break;
            }
            ExchangeStatus::TimedOut => break,
        }
    }
});
