//! Script/host bridge
//!
//! The runtime contract ahead-of-time translated scripts rely on at every
//! call boundary: typed operand exchange, engine structure handles, neutral
//! strings, action dispatch, continuation capture and cooperative abort.
//!
//! ```text
//! translated code ──► Intrinsics ──► HostProgram (host)
//!        ▲                               │
//!        └──── GeneratedProgram ◄────────┘  (entry points, situations)
//! ```

pub mod abort;
pub mod action;
pub mod channel;
pub mod continuation;
pub mod engine;
pub mod error;
pub mod host;
pub mod intrinsics;
pub mod neutral;
pub mod value;

pub use abort::{AbortReason, AbortSignal};
pub use action::{ActionDefinition, ActionId, ActionReturn, ActionTable, ActionType};
pub use channel::OperandChannel;
pub use continuation::{
    GeneratedProgram, ProgramCounter, SavedState, SavedStateHeader, SituationId, StateCapture,
};
pub use engine::{
    EngineHandle, EngineKind, EngineRegistry, EngineStructure, EngineStructureRef,
    MAX_ENGINE_KINDS,
};
pub use error::{BridgeError, BridgeResult, FaultClass};
pub use host::HostProgram;
pub use intrinsics::Intrinsics;
pub use neutral::{NeutralStringHeap, NeutralStringStorage, StringEncoding};
pub use value::{ChannelValue, ObjectId, Operand, OperandKind, Vector3};
