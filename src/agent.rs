//! Agents, their health states, and the three behaviors an agent runs when it is activated:
//! recovery, movement, and contact.
//!
//! Behaviors are exposed through [`ModelAgentExt`], implemented on [`Model`]. A behavior may
//! read and write the state of *other* agents (contact infects cellmates); this is sound
//! because the scheduler only ever activates one agent at a time and each behavior runs to
//! completion, so a write made by one agent is visible to every agent activated after it in
//! the same tick.

use std::fmt::{self, Display};

use log::trace;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::define_rng;
use crate::error::SirvError;
use crate::grid::Position;
use crate::model::Model;
use crate::parameters::Parameters;
use crate::random::ContextRandomExt;

define_rng!(pub(crate) RecoveryRng);
define_rng!(pub(crate) MovementRng);
define_rng!(pub(crate) ContactRng);

/// Stable identity of an agent for the lifetime of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(usize);

impl AgentId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        AgentId(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Transitions only run S -> IU -> RU and V -> IV -> RV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Susceptible,
    Vaccinated,
    InfectedUnvaccinated,
    InfectedVaccinated,
    RecoveredUnvaccinated,
    RecoveredVaccinated,
}

impl HealthState {
    #[must_use]
    pub fn is_infected(self) -> bool {
        matches!(
            self,
            HealthState::InfectedUnvaccinated | HealthState::InfectedVaccinated
        )
    }

    #[must_use]
    pub fn is_recovered(self) -> bool {
        matches!(
            self,
            HealthState::RecoveredUnvaccinated | HealthState::RecoveredVaccinated
        )
    }

    /// Whether the agent belongs to the vaccinated cohort, whatever its stage.
    #[must_use]
    pub fn is_vaccinated(self) -> bool {
        matches!(
            self,
            HealthState::Vaccinated
                | HealthState::InfectedVaccinated
                | HealthState::RecoveredVaccinated
        )
    }

    /// The state an infection moves this state to, if it can be infected at all.
    #[must_use]
    pub fn infected(self) -> Option<HealthState> {
        match self {
            HealthState::Susceptible => Some(HealthState::InfectedUnvaccinated),
            HealthState::Vaccinated => Some(HealthState::InfectedVaccinated),
            _ => None,
        }
    }

    /// The state recovery moves this state to, if it is infected.
    #[must_use]
    pub fn recovered(self) -> Option<HealthState> {
        match self {
            HealthState::InfectedUnvaccinated => Some(HealthState::RecoveredUnvaccinated),
            HealthState::InfectedVaccinated => Some(HealthState::RecoveredVaccinated),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            HealthState::Susceptible => "S",
            HealthState::Vaccinated => "V",
            HealthState::InfectedUnvaccinated => "IU",
            HealthState::InfectedVaccinated => "IV",
            HealthState::RecoveredUnvaccinated => "RU",
            HealthState::RecoveredVaccinated => "RV",
        }
    }
}

impl Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    state: HealthState,
}

impl Agent {
    pub(crate) fn new(id: AgentId, state: HealthState) -> Self {
        Agent { id, state }
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> HealthState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: HealthState) {
        self.state = state;
    }
}

/// Per-tick probability that an agent in `state` recovers, or `None` if it is not infected.
#[must_use]
pub fn recovery_probability(state: HealthState, parameters: &Parameters) -> Option<f64> {
    match state {
        HealthState::InfectedUnvaccinated => Some(parameters.gamma),
        HealthState::InfectedVaccinated => Some(parameters.vaccinated_recovery_probability()),
        _ => None,
    }
}

/// Probability that `source` infects `target` once an effective contact has happened, or
/// `None` if the pair cannot transmit.
///
/// Any infected source transmits to a susceptible target with `beta` and to a vaccinated
/// target with `beta * (1 - eta) * effectiveness`, whatever the source's own cohort.
#[must_use]
pub fn transmission_probability(
    source: HealthState,
    target: HealthState,
    parameters: &Parameters,
) -> Option<f64> {
    if !source.is_infected() {
        return None;
    }
    match target {
        HealthState::Susceptible => Some(parameters.beta),
        HealthState::Vaccinated => Some(parameters.vaccinated_transmission_probability()),
        _ => None,
    }
}

pub trait ModelAgentExt {
    /// Bernoulli recovery trial for an infected agent. Returns whether the agent recovered.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::UnknownAgent` if the id does not belong to this model.
    fn recovery_check(&mut self, agent_id: AgentId) -> Result<bool, SirvError>;

    /// Steps the agent to a uniformly chosen neighboring cell, excluding its own. An agent
    /// with no neighboring cell stays put. Returns the cell the agent ends up on.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::UnknownAgent` if the agent is not on the grid.
    fn move_to_neighbor(&mut self, agent_id: AgentId) -> Result<Position, SirvError>;

    /// Tries to infect every cellmate of the agent. Returns the number of new infections.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::UnknownAgent` if the agent is not on the grid.
    fn contact(&mut self, agent_id: AgentId) -> Result<usize, SirvError>;

    /// Runs the full behavior of one agent: recovery check, then move, then contact.
    ///
    /// # Errors
    ///
    /// Propagates the errors of the individual behaviors.
    fn activate(&mut self, agent_id: AgentId) -> Result<(), SirvError> {
        self.recovery_check(agent_id)?;
        self.move_to_neighbor(agent_id)?;
        self.contact(agent_id)?;
        Ok(())
    }
}

impl ModelAgentExt for Model {
    fn recovery_check(&mut self, agent_id: AgentId) -> Result<bool, SirvError> {
        let state = self.agent_state(agent_id)?;
        let Some(probability) = recovery_probability(state, &self.parameters) else {
            return Ok(false);
        };
        if !self.sample_bool(RecoveryRng, probability) {
            return Ok(false);
        }
        let Some(recovered) = state.recovered() else {
            return Ok(false);
        };
        trace!("agent {agent_id} recovered: {state} -> {recovered}");
        self.set_agent_state(agent_id, recovered)?;
        Ok(true)
    }

    fn move_to_neighbor(&mut self, agent_id: AgentId) -> Result<Position, SirvError> {
        let current = self
            .grid
            .position_of(agent_id)
            .ok_or(SirvError::UnknownAgent(agent_id))?;
        let candidates = self
            .grid
            .neighbors(current, self.parameters.neighborhood, false);
        let Some(target) = self.sample_choice(MovementRng, candidates.as_slice()) else {
            return Ok(current);
        };
        self.grid.move_agent(agent_id, target)?;
        Ok(target)
    }

    fn contact(&mut self, agent_id: AgentId) -> Result<usize, SirvError> {
        let position = self
            .grid
            .position_of(agent_id)
            .ok_or(SirvError::UnknownAgent(agent_id))?;
        let cellmates: Vec<AgentId> = self
            .grid
            .occupants_at(position)?
            .iter()
            .copied()
            .filter(|&other| other != agent_id)
            .collect();

        let beta = self.parameters.beta;
        let mut infections = 0;
        for other in cellmates {
            if !self.sample_bool(ContactRng, beta) {
                continue;
            }
            // Both states are read fresh: either may have changed earlier this tick.
            let source = self.agent_state(agent_id)?;
            let target = self.agent_state(other)?;
            let Some(probability) = transmission_probability(source, target, &self.parameters)
            else {
                continue;
            };
            if !self.sample_bool(ContactRng, probability) {
                continue;
            }
            if let Some(infected) = target.infected() {
                trace!("agent {agent_id} ({source}) infected agent {other}: {target} -> {infected}");
                self.set_agent_state(other, infected)?;
                infections += 1;
            }
        }
        Ok(infections)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::grid::Topology;

    fn parameters(beta: f64, gamma: f64) -> Parameters {
        Parameters {
            beta,
            gamma,
            delta: 1.0,
            eta: 0.0,
            effectiveness: 1.0,
            ..Parameters::default()
        }
    }

    fn model_with(
        parameters: Parameters,
        population: Vec<(HealthState, Position)>,
    ) -> Model {
        Model::with_population(parameters, 42, population).unwrap()
    }

    #[test]
    fn state_transitions_follow_cohort() {
        assert_eq!(
            HealthState::Susceptible.infected(),
            Some(HealthState::InfectedUnvaccinated)
        );
        assert_eq!(
            HealthState::Vaccinated.infected(),
            Some(HealthState::InfectedVaccinated)
        );
        assert_eq!(
            HealthState::InfectedUnvaccinated.recovered(),
            Some(HealthState::RecoveredUnvaccinated)
        );
        assert_eq!(
            HealthState::InfectedVaccinated.recovered(),
            Some(HealthState::RecoveredVaccinated)
        );
        for state in HealthState::iter() {
            if state.is_recovered() {
                assert_eq!(state.infected(), None);
                assert_eq!(state.recovered(), None);
            }
            if let Some(next) = state.infected() {
                assert_eq!(next.is_vaccinated(), state.is_vaccinated());
            }
        }
    }

    #[test]
    fn transmission_table() {
        let params = Parameters {
            beta: 0.8,
            eta: 0.25,
            effectiveness: 0.5,
            ..Parameters::default()
        };
        let to_vaccinated = 0.8 * 0.75 * 0.5;
        for source in [
            HealthState::InfectedUnvaccinated,
            HealthState::InfectedVaccinated,
        ] {
            assert_eq!(
                transmission_probability(source, HealthState::Susceptible, &params),
                Some(0.8)
            );
            let p = transmission_probability(source, HealthState::Vaccinated, &params).unwrap();
            assert!((p - to_vaccinated).abs() < 1e-12);
            for target in [
                HealthState::InfectedUnvaccinated,
                HealthState::InfectedVaccinated,
                HealthState::RecoveredUnvaccinated,
                HealthState::RecoveredVaccinated,
            ] {
                assert_eq!(transmission_probability(source, target, &params), None);
            }
        }
        for source in [
            HealthState::Susceptible,
            HealthState::Vaccinated,
            HealthState::RecoveredUnvaccinated,
            HealthState::RecoveredVaccinated,
        ] {
            for target in HealthState::iter() {
                assert_eq!(transmission_probability(source, target, &params), None);
            }
        }
    }

    #[test]
    fn certain_recovery() {
        let cell = Position::new(0, 0);
        let mut model = model_with(
            parameters(0.0, 1.0),
            vec![
                (HealthState::InfectedUnvaccinated, cell),
                (HealthState::InfectedVaccinated, cell),
                (HealthState::Susceptible, cell),
            ],
        );
        assert!(model.recovery_check(AgentId::new(0)).unwrap());
        assert!(model.recovery_check(AgentId::new(1)).unwrap());
        assert!(!model.recovery_check(AgentId::new(2)).unwrap());
        assert_eq!(
            model.agent_state(AgentId::new(0)).unwrap(),
            HealthState::RecoveredUnvaccinated
        );
        assert_eq!(
            model.agent_state(AgentId::new(1)).unwrap(),
            HealthState::RecoveredVaccinated
        );
        assert_eq!(
            model.agent_state(AgentId::new(2)).unwrap(),
            HealthState::Susceptible
        );
    }

    #[test]
    fn vaccinated_recovery_uses_multiplier() {
        let params = Parameters {
            gamma: 0.5,
            delta: 2.0,
            ..parameters(0.0, 0.5)
        };
        let mut model = model_with(
            params,
            vec![(HealthState::InfectedVaccinated, Position::new(0, 0))],
        );
        assert!(model.recovery_check(AgentId::new(0)).unwrap());
    }

    #[test]
    fn no_recovery_when_gamma_is_zero() {
        let mut model = model_with(
            parameters(0.0, 0.0),
            vec![(HealthState::InfectedUnvaccinated, Position::new(0, 0))],
        );
        for _ in 0..100 {
            assert!(!model.recovery_check(AgentId::new(0)).unwrap());
        }
    }

    #[test]
    fn certain_contact_infects_cellmates() {
        let cell = Position::new(1, 1);
        let mut model = model_with(
            parameters(1.0, 0.0),
            vec![
                (HealthState::InfectedUnvaccinated, cell),
                (HealthState::Susceptible, cell),
                (HealthState::Vaccinated, cell),
                (HealthState::RecoveredUnvaccinated, cell),
                (HealthState::Susceptible, Position::new(2, 2)),
            ],
        );
        assert_eq!(model.contact(AgentId::new(0)).unwrap(), 2);
        assert_eq!(
            model.agent_state(AgentId::new(1)).unwrap(),
            HealthState::InfectedUnvaccinated
        );
        assert_eq!(
            model.agent_state(AgentId::new(2)).unwrap(),
            HealthState::InfectedVaccinated
        );
        assert_eq!(
            model.agent_state(AgentId::new(3)).unwrap(),
            HealthState::RecoveredUnvaccinated
        );
        assert_eq!(
            model.agent_state(AgentId::new(4)).unwrap(),
            HealthState::Susceptible
        );
    }

    #[test]
    fn vaccinated_source_infects() {
        let cell = Position::new(0, 0);
        let mut model = model_with(
            parameters(1.0, 0.0),
            vec![
                (HealthState::InfectedVaccinated, cell),
                (HealthState::Vaccinated, cell),
            ],
        );
        assert_eq!(model.contact(AgentId::new(0)).unwrap(), 1);
        assert_eq!(
            model.agent_state(AgentId::new(1)).unwrap(),
            HealthState::InfectedVaccinated
        );
    }

    #[test]
    fn zero_beta_blocks_transmission() {
        let cell = Position::new(0, 0);
        let mut model = model_with(
            parameters(0.0, 0.0),
            vec![
                (HealthState::InfectedUnvaccinated, cell),
                (HealthState::Susceptible, cell),
                (HealthState::Vaccinated, cell),
            ],
        );
        for _ in 0..100 {
            assert_eq!(model.contact(AgentId::new(0)).unwrap(), 0);
        }
        assert_eq!(
            model.agent_state(AgentId::new(1)).unwrap(),
            HealthState::Susceptible
        );
    }

    #[test]
    fn non_infectious_source_never_transmits() {
        let cell = Position::new(0, 0);
        let mut model = model_with(
            parameters(1.0, 0.0),
            vec![
                (HealthState::Susceptible, cell),
                (HealthState::RecoveredVaccinated, cell),
                (HealthState::Vaccinated, cell),
            ],
        );
        assert_eq!(model.contact(AgentId::new(0)).unwrap(), 0);
        assert_eq!(model.contact(AgentId::new(1)).unwrap(), 0);
    }

    #[test]
    fn infection_cascades_within_a_tick() {
        // An agent infected by an earlier contact transmits on its own contact.
        let (left, right) = (Position::new(0, 0), Position::new(1, 0));
        let mut model = model_with(
            parameters(1.0, 0.0),
            vec![
                (HealthState::InfectedUnvaccinated, left),
                (HealthState::Susceptible, left),
                (HealthState::Susceptible, right),
            ],
        );
        model.contact(AgentId::new(0)).unwrap();
        model.grid.move_agent(AgentId::new(1), right).unwrap();
        assert_eq!(model.contact(AgentId::new(1)).unwrap(), 1);
        assert_eq!(
            model.agent_state(AgentId::new(2)).unwrap(),
            HealthState::InfectedUnvaccinated
        );
    }

    #[test]
    fn move_goes_to_an_adjacent_cell() {
        let params = Parameters {
            width: 5,
            height: 5,
            topology: Topology::Bounded,
            ..parameters(0.0, 0.0)
        };
        let start = Position::new(0, 0);
        let mut model = model_with(params, vec![(HealthState::Susceptible, start)]);
        for _ in 0..50 {
            let before = model.position_of(AgentId::new(0)).unwrap();
            let after = model.move_to_neighbor(AgentId::new(0)).unwrap();
            assert_ne!(before, after);
            assert!(before.x.abs_diff(after.x) <= 1);
            assert!(before.y.abs_diff(after.y) <= 1);
            assert_eq!(model.position_of(AgentId::new(0)), Some(after));
            assert_eq!(model.grid.occupants_at(after).unwrap(), &[AgentId::new(0)]);
        }
    }

    #[test]
    fn move_on_single_cell_stays() {
        let params = Parameters {
            width: 1,
            height: 1,
            ..parameters(0.0, 0.0)
        };
        let mut model = model_with(
            params,
            vec![(HealthState::Susceptible, Position::new(0, 0))],
        );
        assert_eq!(
            model.move_to_neighbor(AgentId::new(0)).unwrap(),
            Position::new(0, 0)
        );
    }

    #[test]
    fn unknown_agent_is_an_error() {
        let mut model = model_with(
            parameters(0.0, 0.0),
            vec![(HealthState::Susceptible, Position::new(0, 0))],
        );
        assert!(matches!(
            model.activate(AgentId::new(5)),
            Err(SirvError::UnknownAgent(_))
        ));
    }
}
