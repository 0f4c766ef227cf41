//! # ember_ai - Orders and State Machines
//!
//! The two AI layers of the simulation core:
//! - `Command`: value-typed low-level orders carried in a per-creature queue
//! - `StateMachine`: the cooperative high-level FSM driving creatures,
//!   with an explicit dispatch ladder instead of the classic macro DSL

pub mod command;
pub mod fsm;
pub mod monster;
pub mod registry;

pub use command::{Command, CommandKind, DEFAULT_COMMAND_TIMEOUT_MS};
pub use fsm::{Fsm, FsmContext, FsmEvent, StateLogic, StateMachine, GLOBAL_STATE};
pub use monster::MonsterFsm;
pub use registry::FsmRegistry;

/// Prelude
pub mod prelude {
    pub use crate::{
        Command, CommandKind, Fsm, FsmContext, FsmEvent, FsmRegistry, StateLogic, StateMachine,
        GLOBAL_STATE,
    };
}
