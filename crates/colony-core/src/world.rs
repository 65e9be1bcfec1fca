use crate::AgentId;

/// Read-only world access.
///
/// The engine never prescribes concrete queries. Subsystems such as movement or reservations
/// define extension traits over this one.
pub trait WorldView {
    type Agent: AgentId;

    /// Whether `agent` still exists. Schedulers return the tasks of vanished agents to the pool.
    fn agent_exists(&self, _agent: Self::Agent) -> bool {
        true
    }
}

/// Write access / effect sink used by leaves that change the world.
pub trait WorldMut: WorldView {}
