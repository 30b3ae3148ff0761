//! Wi-Fi bring-up states and their handler table.
//!
//! ```text
//!  MODULE_DETECT ──[no answer]──▶ MODULE_NOT_DETECTED ◀──────────────┐
//!       │                            │   ▲  [backoff, AT+RST]       │
//!    [OK]                        [ready] └──[no answer]             │
//!       ▼                            ▼                              │
//!  MODULE_INIT ◀─────────────────────┘                              │
//!       │ [OK]                                                      │
//!       ▼                                                           │
//!  CHECK_AP_CONNECTION ──[0.0.0.0]──▶ MODULE_NOT_CONNECTED          │
//!       │ [IP]                          │  ▲ [join failed, backoff] │
//!       │                               │  └──┘                     │
//!       ▼                            [IP]                           │
//!  COMMUNICATION_INIT ◀──────────────────┘                          │
//!       │  ▲ [init refused, backoff]                                │
//!       ▼  └──┘                                                     │
//!  COMMUNICATION_UPDATE ──[link lost]──▶ CHECK_AP_CONNECTION        │
//!       └──────────────[module silent]──────────────────────────────┘
//!
//!  Any state ──[unexpected response, refused request]──▶ FAULT ──▶ MODULE_DETECT
//! ```
//!
//! Every entry abandons whatever exchange was outstanding before issuing
//! its own request.

use log::{error, info, warn};

use crate::app::ports::{CommLayer, SerialPort};
use crate::fsm::{StateDescriptor, StateId};

use super::context::WifiContext;
use super::module::{ModuleResponse, Request};

/// Number of rows in the Wi-Fi state table.
pub const STATE_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    ModuleDetect,
    ModuleNotDetected,
    ModuleInit,
    CheckAPConnection,
    ModuleNotConnected,
    CommunicationInit,
    CommunicationUpdate,
    Fault,
}

impl WifiState {
    pub const ALL: [WifiState; STATE_COUNT] = [
        Self::ModuleDetect,
        Self::ModuleNotDetected,
        Self::ModuleInit,
        Self::CheckAPConnection,
        Self::ModuleNotConnected,
        Self::CommunicationInit,
        Self::CommunicationUpdate,
        Self::Fault,
    ];

    /// Event name reported when this state is entered.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::ModuleDetect => "WIFI_MODULE_DETECT",
            Self::ModuleNotDetected => "WIFI_MODULE_NOT_DETECTED",
            Self::ModuleInit => "WIFI_MODULE_INIT",
            Self::CheckAPConnection => "WIFI_CHECK_AP_CONNECTION",
            Self::ModuleNotConnected => "WIFI_MODULE_NOT_CONNECTED",
            Self::CommunicationInit => "WIFI_COMMUNICATION_INIT",
            Self::CommunicationUpdate => "WIFI_COMMUNICATION_UPDATE",
            Self::Fault => "WIFI_FAULT",
        }
    }
}

impl StateId for WifiState {
    const FAULT: Self = Self::Fault;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

type Ctx<S, L> = WifiContext<S, L>;

/// Build the state table for a given transport and comm layer.
pub fn build_state_table<S: SerialPort, L: CommLayer>()
-> [StateDescriptor<WifiState, Ctx<S, L>>; STATE_COUNT] {
    [
        StateDescriptor {
            id: WifiState::ModuleDetect,
            name: "ModuleDetect",
            on_enter: Some(detect_enter::<S, L>),
            on_exit: None,
            on_update: detect_update::<S, L>,
        },
        StateDescriptor {
            id: WifiState::ModuleNotDetected,
            name: "ModuleNotDetected",
            on_enter: Some(not_detected_enter::<S, L>),
            on_exit: None,
            on_update: not_detected_update::<S, L>,
        },
        StateDescriptor {
            id: WifiState::ModuleInit,
            name: "ModuleInit",
            on_enter: Some(init_enter::<S, L>),
            on_exit: None,
            on_update: init_update::<S, L>,
        },
        StateDescriptor {
            id: WifiState::CheckAPConnection,
            name: "CheckAPConnection",
            on_enter: Some(check_ap_enter::<S, L>),
            on_exit: None,
            on_update: check_ap_update::<S, L>,
        },
        StateDescriptor {
            id: WifiState::ModuleNotConnected,
            name: "ModuleNotConnected",
            on_enter: Some(not_connected_enter::<S, L>),
            on_exit: None,
            on_update: not_connected_update::<S, L>,
        },
        StateDescriptor {
            id: WifiState::CommunicationInit,
            name: "CommunicationInit",
            on_enter: Some(comm_init_enter::<S, L>),
            on_exit: None,
            on_update: comm_init_update::<S, L>,
        },
        StateDescriptor {
            id: WifiState::CommunicationUpdate,
            name: "CommunicationUpdate",
            on_enter: Some(comm_update_enter::<S, L>),
            on_exit: Some(comm_update_exit::<S, L>),
            on_update: comm_update_update::<S, L>,
        },
        StateDescriptor {
            id: WifiState::Fault,
            name: "Fault",
            on_enter: Some(fault_enter::<S, L>),
            on_exit: Some(fault_exit::<S, L>),
            on_update: fault_update::<S, L>,
        },
    ]
}

// ───────────────────────────────────────────────────────────────
// Shared helpers
// ───────────────────────────────────────────────────────────────

/// Abandon the previous exchange and issue `request`.  A refused request
/// is recorded as a fault for the next update to act on.
fn issue<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>, request: Request<'_>) {
    ctx.module.reset();
    send(ctx, request);
}

fn send<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>, request: Request<'_>) {
    if let Err(e) = ctx.module.send(request) {
        error!("wifi: request refused: {}", e);
        ctx.fault = Some("request refused by AT engine");
    }
}

fn poll<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Result<ModuleResponse, WifiState> {
    if ctx.fault.is_some() {
        return Err(WifiState::Fault);
    }
    ctx.module.poll(ctx.elapsed_ms).map_err(|e| {
        error!("wifi: poll failed: {}", e);
        ctx.fault = Some("poll without outstanding request");
        WifiState::Fault
    })
}

fn unexpected<S: SerialPort, L: CommLayer>(
    ctx: &mut Ctx<S, L>,
    state: &str,
    response: &ModuleResponse,
) -> Option<WifiState> {
    error!("wifi: {} got unexpected {:?}", state, response);
    ctx.fault = Some("unexpected module response");
    Some(WifiState::Fault)
}

fn join<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.join_attempts = ctx.join_attempts.saturating_add(1);
    let ssid = ctx.settings.ssid.clone();
    let password = ctx.settings.password.clone();
    send(
        ctx,
        Request::JoinAp {
            ssid: ssid.as_str(),
            password: password.as_str(),
        },
    );
    ctx.join_sent = true;
}

// ═══════════════════════════════════════════════════════════════════════════
//  MODULE_DETECT
// ═══════════════════════════════════════════════════════════════════════════

fn detect_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    issue(ctx, Request::Detect);
}

fn detect_update<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    match poll(ctx) {
        Err(fault) => Some(fault),
        Ok(ModuleResponse::Pending) => None,
        Ok(ModuleResponse::Detected) => {
            info!("wifi: module detected");
            Some(WifiState::ModuleInit)
        }
        Ok(ModuleResponse::NotDetected) => {
            warn!("wifi: module not answering");
            Some(WifiState::ModuleNotDetected)
        }
        Ok(other) => unexpected(ctx, "ModuleDetect", &other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  MODULE_NOT_DETECTED: reset every backoff window until it answers
// ═══════════════════════════════════════════════════════════════════════════

fn not_detected_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.module.reset();
    ctx.forget_link();
    ctx.retry.set_duration(ctx.settings.retry_backoff_ms);
    info!(
        "wifi: resetting module in {} ms",
        ctx.settings.retry_backoff_ms
    );
}

fn not_detected_update<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    if !ctx.reset_sent {
        if ctx.retry.update(ctx.elapsed_ms) {
            send(ctx, Request::Reset);
            ctx.reset_sent = true;
        }
        return None;
    }
    match poll(ctx) {
        Err(fault) => Some(fault),
        Ok(ModuleResponse::Pending) => None,
        Ok(ModuleResponse::ResetComplete) => {
            info!("wifi: module reset complete");
            Some(WifiState::ModuleInit)
        }
        Ok(ModuleResponse::NotDetected) => {
            warn!("wifi: reset unanswered, retrying in {} ms", ctx.retry.duration_ms());
            ctx.reset_sent = false;
            ctx.retry.restart();
            None
        }
        Ok(other) => unexpected(ctx, "ModuleNotDetected", &other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  MODULE_INIT
// ═══════════════════════════════════════════════════════════════════════════

fn init_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    issue(ctx, Request::Init);
}

fn init_update<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    match poll(ctx) {
        Err(fault) => Some(fault),
        Ok(ModuleResponse::Pending) => None,
        Ok(ModuleResponse::InitComplete) => Some(WifiState::CheckAPConnection),
        Ok(ModuleResponse::NotDetected) => Some(WifiState::ModuleNotDetected),
        Ok(other) => unexpected(ctx, "ModuleInit", &other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CHECK_AP_CONNECTION
// ═══════════════════════════════════════════════════════════════════════════

fn check_ap_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    issue(ctx, Request::ApStatus);
}

fn check_ap_update<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    match poll(ctx) {
        Err(fault) => Some(fault),
        Ok(ModuleResponse::Pending) => None,
        Ok(ModuleResponse::Connected(ip)) => {
            info!("wifi: already associated, ip {}", ip);
            ctx.ip = Some(ip);
            Some(WifiState::CommunicationInit)
        }
        Ok(ModuleResponse::NotConnected) => Some(WifiState::ModuleNotConnected),
        Ok(ModuleResponse::NotDetected) => Some(WifiState::ModuleNotDetected),
        Ok(other) => unexpected(ctx, "CheckAPConnection", &other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  MODULE_NOT_CONNECTED: join now, then once per backoff window
// ═══════════════════════════════════════════════════════════════════════════

fn not_connected_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.module.reset();
    ctx.retry.set_duration(ctx.settings.retry_backoff_ms);
    ctx.join_sent = false;
    join(ctx);
}

fn not_connected_update<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    if !ctx.join_sent {
        if ctx.retry.update(ctx.elapsed_ms) {
            join(ctx);
        }
        return None;
    }
    match poll(ctx) {
        Err(fault) => Some(fault),
        Ok(ModuleResponse::Pending) => None,
        Ok(ModuleResponse::Connected(ip)) => {
            info!(
                "wifi: joined '{}' after {} attempt(s), ip {}",
                ctx.settings.ssid, ctx.join_attempts, ip
            );
            ctx.ip = Some(ip);
            ctx.last_join_error = None;
            Some(WifiState::CommunicationInit)
        }
        Ok(ModuleResponse::JoinFailed(reason)) => {
            warn!(
                "wifi: join failed ({:?}), retrying in {} ms",
                reason,
                ctx.retry.duration_ms()
            );
            ctx.last_join_error = Some(reason);
            ctx.join_sent = false;
            ctx.retry.restart();
            None
        }
        Ok(ModuleResponse::NotDetected) => Some(WifiState::ModuleNotDetected),
        Ok(other) => unexpected(ctx, "ModuleNotConnected", &other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  COMMUNICATION_INIT: open the data layer, retried per backoff window
// ═══════════════════════════════════════════════════════════════════════════

fn comm_init_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.module.reset();
    ctx.retry.set_duration(ctx.settings.retry_backoff_ms);
    if !ctx.comm_ready {
        open_comm(ctx);
    }
}

fn comm_init_update<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    if !ctx.comm_ready && ctx.retry.update(ctx.elapsed_ms) {
        open_comm(ctx);
    }
    ctx.comm_ready.then_some(WifiState::CommunicationUpdate)
}

fn open_comm<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    let ip = ctx.ip.clone().unwrap_or_default();
    match ctx.comm.init(ip.as_str()) {
        Ok(()) => ctx.comm_ready = true,
        Err(e) => warn!(
            "wifi: communication layer init failed ({}), retrying in {} ms",
            e,
            ctx.retry.duration_ms()
        ),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  COMMUNICATION_UPDATE: steady state with periodic link supervision
// ═══════════════════════════════════════════════════════════════════════════

fn comm_update_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.module.reset();
    ctx.link_check.set_duration(ctx.settings.link_check_interval_ms);
    ctx.link_check_pending = false;
    info!("wifi: link up");
}

fn comm_update_exit<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.comm.shutdown();
    ctx.comm_ready = false;
    ctx.link_check_pending = false;
    info!("wifi: link down");
}

fn comm_update_update<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    ctx.comm.update(ctx.elapsed_ms);

    if !ctx.link_check_pending {
        if ctx.link_check.update(ctx.elapsed_ms) {
            send(ctx, Request::ApStatus);
            ctx.link_check_pending = true;
        }
        return None;
    }
    match poll(ctx) {
        Err(fault) => Some(fault),
        Ok(ModuleResponse::Pending) => None,
        Ok(ModuleResponse::Connected(ip)) => {
            if ctx.ip.as_ref() != Some(&ip) {
                info!("wifi: address changed to {}", ip);
                ctx.ip = Some(ip);
            }
            ctx.link_check_pending = false;
            None
        }
        Ok(ModuleResponse::NotConnected) => {
            warn!("wifi: AP link lost");
            ctx.ip = None;
            Some(WifiState::CheckAPConnection)
        }
        Ok(ModuleResponse::NotDetected) => {
            warn!("wifi: module stopped answering");
            Some(WifiState::ModuleNotDetected)
        }
        Ok(other) => unexpected(ctx, "CommunicationUpdate", &other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULT: log, then restart bring-up from detection
// ═══════════════════════════════════════════════════════════════════════════

fn fault_enter<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.module.reset();
    error!(
        "wifi: fault ({}), restarting bring-up",
        ctx.fault.unwrap_or("unreachable transition")
    );
}

fn fault_exit<S: SerialPort, L: CommLayer>(ctx: &mut Ctx<S, L>) {
    ctx.fault = None;
    ctx.forget_link();
}

fn fault_update<S: SerialPort, L: CommLayer>(_ctx: &mut Ctx<S, L>) -> Option<WifiState> {
    Some(WifiState::ModuleDetect)
}
