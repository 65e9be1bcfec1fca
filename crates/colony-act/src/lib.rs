//! Act tree runtime built on `colony-core`.
//!
//! An [`Act`] is one node of a creature's script. The fixed combinator vocabulary is a closed
//! enum ([`ActKind`]) so the runtime can match on it exhaustively; open-ended behaviours are
//! leaves implementing [`colony_core::Action`]. Higher-level behaviours are assembled from these
//! pieces and exposed as a single node through [`Compound`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod act;
pub mod builder;
pub mod composite;
pub mod compound;
pub mod decorator;
pub mod leaves;
pub mod movement;
pub mod reserve;
pub mod wrap;

pub use act::{Act, ActKind, ActState, Predicate};
pub use composite::{Parallel, ParallelPolicy, Select, Sequence};
pub use compound::{CancelHook, Compound, TreeFactory};
pub use decorator::{Domain, ForLoop, WhileLoop};
pub use leaves::{Always, ClearValue, Condition, FailWith, SetValue, Wait};
pub use movement::{GoTo, PathPoll, PathWorld};
pub use reserve::ReserveGuard;
pub use wrap::{StepFn, Wrap};
