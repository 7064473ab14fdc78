//! Random activation: every tick all agents are activated once, one at a time, in a fresh
//! uniformly random order.
//!
//! The scheduler hands out the order and tracks which agent currently holds the right to
//! mutate the world. The model drives the loop itself (see `Model::step`) because activating
//! an agent needs mutable access to the whole model.

use log::trace;

use crate::agent::AgentId;
use crate::define_rng;
use crate::random::ContextRandomExt;

define_rng!(pub(crate) ActivationRng);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Idle,
    Activating(AgentId),
}

#[derive(Debug, Default)]
pub struct RandomActivation {
    state: ActivationState,
    passes: u64,
}

impl RandomActivation {
    #[must_use]
    pub fn new() -> Self {
        RandomActivation::default()
    }

    #[must_use]
    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Number of completed passes.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Starts a pass: returns a uniformly random permutation of `0..population`.
    /// No order survives from one pass to the next.
    pub fn begin_pass(
        &mut self,
        rngs: &mut impl ContextRandomExt,
        population: usize,
    ) -> Vec<AgentId> {
        debug_assert_eq!(self.state, ActivationState::Idle);
        let mut order: Vec<AgentId> = (0..population).map(AgentId::new).collect();
        rngs.shuffle(ActivationRng, &mut order);
        trace!("activation pass {} over {population} agents", self.passes);
        order
    }

    /// Grants `agent_id` exclusive mutation rights until the next call.
    pub fn activating(&mut self, agent_id: AgentId) {
        self.state = ActivationState::Activating(agent_id);
    }

    pub fn end_pass(&mut self) {
        self.state = ActivationState::Idle;
        self.passes += 1;
    }

    /// Returns to `Idle` after a failed activation without counting the pass.
    pub fn abort_pass(&mut self) {
        self.state = ActivationState::Idle;
    }
}
