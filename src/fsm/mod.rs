//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable<S, C, N>                                           │
//! │  ┌──────────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ S (state id) │ on_enter  │ on_exit  │ on_update         │   │
//! │  ├──────────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ S::from(0)   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<S>│   │
//! │  │ S::from(1)   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<S>│   │
//! │  │ ...          │           │          │                   │   │
//! │  │ S::FAULT     │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<S>│   │
//! │  └──────────────┴───────────┴──────────┴───────────────────┘   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut C`, the machine's
//! context record.
//!
//! Entry runs exactly once per arrival and exit exactly once per
//! departure; the engine tracks this with an entry-done flag that exit
//! clears, so re-entering a state always re-runs its entry logic.

use core::fmt::Debug;

use log::{error, info};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Implemented by each machine's state enum.
///
/// `index` must be dense in `0..N` and agree with the table layout; the
/// engine checks this at construction.
pub trait StateId: Copy + Eq + Debug {
    /// State entered when the table is asked for something it cannot hold.
    const FAULT: Self;

    fn index(self) -> usize;

    fn from_index(idx: usize) -> Option<Self>;
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn<C> = fn(&mut C);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn<S, C> = fn(&mut C) -> Option<S>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array; no heap, no `dyn`.
pub struct StateDescriptor<S, C> {
    pub id: S,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<C>>,
    pub on_exit: Option<StateActionFn<C>>,
    pub on_update: StateUpdateFn<S, C>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table; the context is owned by the caller and threaded
/// through every handler call.
pub struct Fsm<S: StateId, C, const N: usize> {
    table: [StateDescriptor<S, C>; N],
    current: usize,
    entry_done: bool,
}

impl<S: StateId, C, const N: usize> Fsm<S, C, N> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    ///
    /// A table row whose `id` does not sit at its own index is a build
    /// mistake; the engine logs it and starts in `S::FAULT` instead.
    pub fn new(table: [StateDescriptor<S, C>; N], initial: S) -> Self {
        let consistent = table
            .iter()
            .enumerate()
            .all(|(idx, desc)| desc.id.index() == idx);
        let start = if consistent && initial.index() < N {
            initial.index()
        } else {
            error!("FSM table inconsistent, starting in fault state");
            S::FAULT.index().min(N.saturating_sub(1))
        };
        Self {
            table,
            current: start,
            entry_done: false,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut C) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.enter(ctx);
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Run a pending `on_enter` (only if `start` was skipped).
    /// 2. Call `on_update` for the current state.
    /// 3. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut C) {
        if !self.entry_done {
            self.enter(ctx);
        }

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            if next_id.index() != self.current {
                self.transition(next_id, ctx);
            }
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> S {
        self.table[self.current].id
    }

    /// Display name of the current state.
    pub fn current_name(&self) -> &'static str {
        self.table[self.current].name
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn enter(&mut self, ctx: &mut C) {
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
        self.entry_done = true;
    }

    fn transition(&mut self, next_id: S, ctx: &mut C) {
        let next_idx = if next_id.index() < N {
            next_id.index()
        } else {
            error!(
                "FSM: {:?} is not in the table, falling back to {:?}",
                next_id,
                S::FAULT
            );
            S::FAULT.index()
        };

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }
        self.entry_done = false;

        self.current = next_idx;

        // Enter new state
        self.enter(ctx);
    }
}
