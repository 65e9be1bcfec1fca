//! Deterministic, engine-agnostic primitives for the colony act engine.
//!
//! Everything an act tree needs to run lives here: the three-valued [`Status`], the leaf
//! [`Action`] protocol, the per-agent [`Blackboard`], and the reservation registry scripts use to
//! claim shared world objects. Combinators live in `colony-act`, task scheduling in `colony-task`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod agent;
pub mod blackboard;
pub mod error;
pub mod reservation;
pub mod status;
pub mod tick;
pub mod world;

pub use action::Action;
pub use agent::{AgentId, CreatureId};
pub use blackboard::{BbKey, Blackboard, FAILURE_REASON};
pub use error::{ActError, BlackboardError, ReservationError};
pub use reservation::{ReservationTable, ReservationWorld};
pub use status::Status;
pub use tick::TickContext;
pub use world::{WorldMut, WorldView};
