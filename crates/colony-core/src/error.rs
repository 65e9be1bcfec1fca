use thiserror::Error;

/// Misuse of the blackboard by composed content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("required blackboard entry `{key}` ({type_name}) is missing")]
    Missing {
        key: &'static str,
        type_name: &'static str,
    },
}

/// Misuse of a [`ReservationTable`](crate::ReservationTable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("{resource} is already reserved by agent {holder}")]
    AlreadyReserved { resource: String, holder: u64 },

    #[error("{resource} is not reserved by agent {agent}")]
    NotHeld { resource: String, agent: u64 },
}

/// Programming error raised while stepping an act tree.
///
/// These never describe a normal game outcome; they abort the script that raised them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActError {
    #[error(transparent)]
    Blackboard(#[from] BlackboardError),

    #[error(transparent)]
    Reservation(#[from] ReservationError),

    #[error("compound act `{name}` produced no tree")]
    NoTree { name: String },

    #[error("act `{name}`: {reason}")]
    Invalid { name: String, reason: String },
}

impl ActError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ActError::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
