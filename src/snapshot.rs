//! Read-only views of the world handed to collaborators between ticks.

use std::fmt::{self, Display};

use serde::Serialize;

use crate::agent::{AgentId, HealthState};
use crate::grid::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub state: HealthState,
    pub position: Position,
}

/// Every agent as it stood at the end of `tick`, in id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub agents: Vec<AgentSnapshot>,
}

impl TickSnapshot {
    #[must_use]
    pub fn counts(&self) -> StateCounts {
        StateCounts::from_states(self.agents.iter().map(|agent| agent.state))
    }
}

/// Number of agents in each health state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub susceptible: usize,
    pub vaccinated: usize,
    pub infected_unvaccinated: usize,
    pub infected_vaccinated: usize,
    pub recovered_unvaccinated: usize,
    pub recovered_vaccinated: usize,
}

impl StateCounts {
    pub fn from_states(states: impl IntoIterator<Item = HealthState>) -> Self {
        let mut counts = StateCounts::default();
        for state in states {
            *counts.get_mut(state) += 1;
        }
        counts
    }

    fn get_mut(&mut self, state: HealthState) -> &mut usize {
        match state {
            HealthState::Susceptible => &mut self.susceptible,
            HealthState::Vaccinated => &mut self.vaccinated,
            HealthState::InfectedUnvaccinated => &mut self.infected_unvaccinated,
            HealthState::InfectedVaccinated => &mut self.infected_vaccinated,
            HealthState::RecoveredUnvaccinated => &mut self.recovered_unvaccinated,
            HealthState::RecoveredVaccinated => &mut self.recovered_vaccinated,
        }
    }

    #[must_use]
    pub fn get(&self, state: HealthState) -> usize {
        match state {
            HealthState::Susceptible => self.susceptible,
            HealthState::Vaccinated => self.vaccinated,
            HealthState::InfectedUnvaccinated => self.infected_unvaccinated,
            HealthState::InfectedVaccinated => self.infected_vaccinated,
            HealthState::RecoveredUnvaccinated => self.recovered_unvaccinated,
            HealthState::RecoveredVaccinated => self.recovered_vaccinated,
        }
    }

    #[must_use]
    pub fn infected(&self) -> usize {
        self.infected_unvaccinated + self.infected_vaccinated
    }

    #[must_use]
    pub fn recovered(&self) -> usize {
        self.recovered_unvaccinated + self.recovered_vaccinated
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.susceptible + self.vaccinated + self.infected() + self.recovered()
    }
}

impl Display for StateCounts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "S={} V={} IU={} IV={} RU={} RV={}",
            self.susceptible,
            self.vaccinated,
            self.infected_unvaccinated,
            self.infected_vaccinated,
            self.recovered_unvaccinated,
            self.recovered_vaccinated
        )
    }
}
