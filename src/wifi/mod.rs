//! Wi-Fi bring-up: ESP8266 request layer, session record and state table,
//! owned together by [`WifiManager`].

pub mod context;
pub mod module;
pub mod states;

use crate::app::ports::{CommLayer, SerialPort};
use crate::fsm::Fsm;

use context::{WifiContext, WifiSettings};
use module::{IpString, JoinError, WifiModule};
use states::{STATE_COUNT, WifiState, build_state_table};

/// Bring-up machine plus the session record it drives.
pub struct WifiManager<S: SerialPort, L: CommLayer> {
    fsm: Fsm<WifiState, WifiContext<S, L>, STATE_COUNT>,
    ctx: WifiContext<S, L>,
}

impl<S: SerialPort, L: CommLayer> WifiManager<S, L> {
    pub fn new(module: WifiModule<S>, comm: L, settings: WifiSettings) -> Self {
        Self {
            fsm: Fsm::new(build_state_table::<S, L>(), WifiState::ModuleDetect),
            ctx: WifiContext::new(module, comm, settings),
        }
    }

    /// Run the entry logic of `ModuleDetect`.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
    }

    /// One scheduling pass.  Returns the new state when this pass changed it.
    pub fn update(&mut self, elapsed_ms: u32) -> Option<WifiState> {
        let before = self.fsm.current_state();
        self.ctx.elapsed_ms = elapsed_ms;
        self.fsm.tick(&mut self.ctx);
        let after = self.fsm.current_state();
        (after != before).then_some(after)
    }

    pub fn state(&self) -> WifiState {
        self.fsm.current_state()
    }

    pub fn state_name(&self) -> &'static str {
        self.fsm.current_name()
    }

    pub fn is_online(&self) -> bool {
        self.state() == WifiState::CommunicationUpdate
    }

    pub fn ip(&self) -> Option<&IpString> {
        self.ctx.ip.as_ref()
    }

    pub fn last_join_error(&self) -> Option<JoinError> {
        self.ctx.last_join_error
    }

    pub fn join_attempts(&self) -> u32 {
        self.ctx.join_attempts
    }

    pub fn comm(&self) -> &L {
        &self.ctx.comm
    }

    pub fn module(&self) -> &WifiModule<S> {
        &self.ctx.module
    }

    pub fn module_mut(&mut self) -> &mut WifiModule<S> {
        &mut self.ctx.module
    }
}
