//! The simulation model: owns the grid, the agents, the random streams, and the tick counter,
//! and advances the world one random-activation pass at a time.
//!
//! ```
//! use sirv::model::Model;
//! use sirv::parameters::Parameters;
//!
//! let mut model = Model::new(Parameters::default(), 42).unwrap();
//! model.subscribe_to_tick_end(|snapshot| {
//!     println!("tick {}: {}", snapshot.tick, snapshot.counts());
//! });
//! model.run(10).unwrap();
//! assert_eq!(model.tick(), 10);
//! ```

use log::{debug, info, log_enabled, Level};

use crate::agent::{Agent, AgentId, HealthState, ModelAgentExt};
use crate::define_rng;
use crate::error::SirvError;
use crate::grid::{Grid, Position};
use crate::parameters::Parameters;
use crate::random::{ContextRandomExt, RngStore};
use crate::scheduler::RandomActivation;
use crate::snapshot::{AgentSnapshot, StateCounts, TickSnapshot};

define_rng!(pub(crate) PlacementRng);
define_rng!(pub(crate) SeedingRng);

type TickEndCallback = dyn FnMut(&TickSnapshot);

pub struct Model {
    pub(crate) parameters: Parameters,
    pub(crate) grid: Grid,
    pub(crate) agents: Vec<Agent>,
    rngs: RngStore,
    scheduler: RandomActivation,
    tick: u64,
    tick_end_subscribers: Vec<Box<TickEndCallback>>,
}

impl Model {
    fn empty(parameters: Parameters, base_seed: u64) -> Result<Self, SirvError> {
        parameters.validate()?;
        let grid = Grid::new(parameters.width, parameters.height, parameters.topology)?;
        let mut agents = Vec::new();
        agents.try_reserve_exact(parameters.population).map_err(|_| {
            SirvError::ConfigurationError(format!(
                "population {} cannot be allocated",
                parameters.population
            ))
        })?;
        Ok(Model {
            agents,
            parameters,
            grid,
            rngs: RngStore::new(base_seed),
            scheduler: RandomActivation::new(),
            tick: 0,
            tick_end_subscribers: Vec::new(),
        })
    }

    /// Builds the population: agents `0..vaccinated` start Vaccinated and the rest
    /// Susceptible; each is placed on a uniformly random cell and then independently seeded
    /// as infected with the probability of its cohort.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::ConfigurationError` if `parameters` fail validation.
    pub fn new(parameters: Parameters, base_seed: u64) -> Result<Self, SirvError> {
        let mut model = Model::empty(parameters, base_seed)?;
        let (width, height) = (model.parameters.width, model.parameters.height);

        for index in 0..model.parameters.population {
            let agent_id = AgentId::new(index);
            let cohort = if index < model.parameters.vaccinated {
                HealthState::Vaccinated
            } else {
                HealthState::Susceptible
            };

            let x = model.sample_range(PlacementRng, 0..width);
            let y = model.sample_range(PlacementRng, 0..height);
            model.grid.place_agent(agent_id, Position::new(x, y))?;

            let seed_probability = if cohort.is_vaccinated() {
                model.parameters.initial_infection_vaccinated
            } else {
                model.parameters.initial_infection_susceptible
            };
            let state = if model.sample_bool(SeedingRng, seed_probability) {
                cohort.infected().unwrap_or(cohort)
            } else {
                cohort
            };
            model.agents.push(Agent::new(agent_id, state));
        }

        let counts = model.counts();
        info!(
            "model created: population={} vaccinated={} grid={}x{} initial infections={}",
            model.parameters.population,
            model.parameters.vaccinated,
            width,
            height,
            counts.infected()
        );
        Ok(model)
    }

    /// Builds a model from an explicit list of agents, skipping random placement and
    /// infection seeding. Agent ids follow the order of `population`. The `population` and
    /// `vaccinated` fields of `parameters` are replaced by the counts of the list.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::ConfigurationError` if the list is empty or `parameters` fail
    /// validation, and `SirvError::OutOfBounds` if a position lies outside a bounded grid.
    pub fn with_population(
        mut parameters: Parameters,
        base_seed: u64,
        population: impl IntoIterator<Item = (HealthState, Position)>,
    ) -> Result<Self, SirvError> {
        let population: Vec<(HealthState, Position)> = population.into_iter().collect();
        parameters.population = population.len();
        parameters.vaccinated = population
            .iter()
            .filter(|(state, _)| state.is_vaccinated())
            .count();

        let mut model = Model::empty(parameters, base_seed)?;
        for (index, (state, position)) in population.into_iter().enumerate() {
            let agent_id = AgentId::new(index);
            model.grid.place_agent(agent_id, position)?;
            model.agents.push(Agent::new(agent_id, state));
        }
        Ok(model)
    }

    /// Runs one tick: every agent is activated exactly once, in a fresh random order, then
    /// tick-end subscribers receive a snapshot of the world.
    ///
    /// # Errors
    ///
    /// Returns an error if an activation fails, which indicates a broken grid invariant.
    pub fn step(&mut self) -> Result<(), SirvError> {
        let order = self.scheduler.begin_pass(&mut self.rngs, self.agents.len());
        for agent_id in order {
            self.scheduler.activating(agent_id);
            if let Err(error) = self.activate(agent_id) {
                self.scheduler.abort_pass();
                return Err(error);
            }
        }
        self.scheduler.end_pass();
        self.tick += 1;

        if log_enabled!(Level::Debug) {
            debug!("tick {}: {}", self.tick, self.counts());
        }
        if !self.tick_end_subscribers.is_empty() {
            let snapshot = self.snapshot();
            for callback in &mut self.tick_end_subscribers {
                callback(&snapshot);
            }
        }
        Ok(())
    }

    /// Calls [`Model::step`] `num_ticks` times. The model never stops on its own, even once
    /// no infected agent is left.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error from `step`.
    pub fn run(&mut self, num_ticks: u64) -> Result<(), SirvError> {
        for _ in 0..num_ticks {
            self.step()?;
        }
        Ok(())
    }

    /// Registers a callback invoked with a read-only snapshot at the end of every tick.
    pub fn subscribe_to_tick_end(&mut self, callback: impl FnMut(&TickSnapshot) + 'static) {
        self.tick_end_subscribers.push(Box::new(callback));
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.agents.len()
    }

    /// The current health state of an agent.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::UnknownAgent` if the id does not belong to this model.
    pub fn agent_state(&self, agent_id: AgentId) -> Result<HealthState, SirvError> {
        self.agents
            .get(agent_id.index())
            .map(Agent::state)
            .ok_or(SirvError::UnknownAgent(agent_id))
    }

    pub(crate) fn set_agent_state(
        &mut self,
        agent_id: AgentId,
        state: HealthState,
    ) -> Result<(), SirvError> {
        self.agents
            .get_mut(agent_id.index())
            .ok_or(SirvError::UnknownAgent(agent_id))?
            .set_state(state);
        Ok(())
    }

    #[must_use]
    pub fn position_of(&self, agent_id: AgentId) -> Option<Position> {
        self.grid.position_of(agent_id)
    }

    #[must_use]
    pub fn counts(&self) -> StateCounts {
        StateCounts::from_states(self.agents.iter().map(Agent::state))
    }

    /// Every agent's id, state, and position at the current tick.
    #[must_use]
    pub fn snapshot(&self) -> TickSnapshot {
        let agents = self
            .agents
            .iter()
            .filter_map(|agent| {
                let position = self.grid.position_of(agent.id())?;
                Some(AgentSnapshot {
                    id: agent.id(),
                    state: agent.state(),
                    position,
                })
            })
            .collect();
        TickSnapshot {
            tick: self.tick,
            agents,
        }
    }
}

impl ContextRandomExt for Model {
    fn rng_store(&mut self) -> &mut RngStore {
        &mut self.rngs
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::grid::Topology;

    fn parameters() -> Parameters {
        Parameters {
            population: 200,
            vaccinated: 80,
            width: 12,
            height: 12,
            initial_infection_vaccinated: 0.1,
            initial_infection_susceptible: 0.2,
            ..Parameters::default()
        }
    }

    fn assert_grid_consistent(model: &Model) {
        let mut seen = vec![0usize; model.population()];
        for (position, occupants) in model.grid().cells() {
            for &agent_id in occupants {
                seen[agent_id.index()] += 1;
                assert_eq!(model.position_of(agent_id), Some(position));
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn invalid_parameters_fail_construction() {
        let parameters = Parameters {
            vaccinated: 20,
            population: 10,
            ..Parameters::default()
        };
        assert!(matches!(
            Model::new(parameters, 0),
            Err(SirvError::ConfigurationError(_))
        ));
    }

    #[test]
    fn population_is_seeded_by_cohort() {
        let model = Model::new(parameters(), 42).unwrap();
        assert_eq!(model.population(), 200);
        for agent in model.agents() {
            let vaccinated_cohort = agent.id().index() < 80;
            assert_eq!(agent.state().is_vaccinated(), vaccinated_cohort);
            assert!(!agent.state().is_recovered());
        }
        assert_grid_consistent(&model);
    }

    #[test]
    fn certain_seeding_infects_everyone() {
        let parameters = Parameters {
            initial_infection_vaccinated: 1.0,
            initial_infection_susceptible: 1.0,
            ..parameters()
        };
        let counts = Model::new(parameters, 1).unwrap().counts();
        assert_eq!(counts.infected_vaccinated, 80);
        assert_eq!(counts.infected_unvaccinated, 120);
    }

    #[test]
    fn zero_seeding_infects_nobody() {
        let parameters = Parameters {
            initial_infection_vaccinated: 0.0,
            initial_infection_susceptible: 0.0,
            ..parameters()
        };
        let counts = Model::new(parameters, 1).unwrap().counts();
        assert_eq!(counts.vaccinated, 80);
        assert_eq!(counts.susceptible, 120);
    }

    #[test]
    fn with_population_overrides_counts() {
        let model = Model::with_population(
            Parameters::default(),
            0,
            [
                (HealthState::Vaccinated, Position::new(0, 0)),
                (HealthState::RecoveredVaccinated, Position::new(1, 1)),
                (HealthState::Susceptible, Position::new(2, 2)),
            ],
        )
        .unwrap();
        assert_eq!(model.parameters().population, 3);
        assert_eq!(model.parameters().vaccinated, 2);
        assert_eq!(model.position_of(AgentId::new(2)), Some(Position::new(2, 2)));
    }

    #[test]
    fn with_population_rejects_empty_and_out_of_bounds() {
        assert!(matches!(
            Model::with_population(Parameters::default(), 0, []),
            Err(SirvError::ConfigurationError(_))
        ));
        let bounded = Parameters {
            topology: Topology::Bounded,
            ..Parameters::default()
        };
        assert!(matches!(
            Model::with_population(
                bounded,
                0,
                [(HealthState::Susceptible, Position::new(10, 0))]
            ),
            Err(SirvError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn step_keeps_population_and_grid_consistent() {
        let mut model = Model::new(parameters(), 7).unwrap();
        for _ in 0..25 {
            model.step().unwrap();
            assert_eq!(model.population(), 200);
            assert_eq!(model.counts().total(), 200);
            assert_eq!(model.grid().agent_count(), 200);
            assert_grid_consistent(&model);
        }
        assert_eq!(model.tick(), 25);
    }

    #[test]
    fn same_seed_reproduces_run() {
        let record = |seed: u64| {
            let history = Rc::new(RefCell::new(Vec::new()));
            let mut model = Model::new(parameters(), seed).unwrap();
            let sink = Rc::clone(&history);
            model.subscribe_to_tick_end(move |snapshot| sink.borrow_mut().push(snapshot.clone()));
            model.run(15).unwrap();
            let history = history.borrow().clone();
            history
        };
        let first = record(2024);
        assert_eq!(first.len(), 15);
        assert_eq!(first, record(2024));
        assert_ne!(first, record(2025));
    }

    #[test]
    fn subscribers_see_every_tick_in_order() {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let mut model = Model::new(parameters(), 3).unwrap();
        let sink = Rc::clone(&ticks);
        model.subscribe_to_tick_end(move |snapshot| {
            assert_eq!(snapshot.agents.len(), 200);
            sink.borrow_mut().push(snapshot.tick);
        });
        model.run(4).unwrap();
        assert_eq!(*ticks.borrow(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn single_cell_outbreak_in_one_tick() {
        // On a 1x1 torus nobody can move, so the infected agent meets everyone.
        let parameters = Parameters {
            width: 1,
            height: 1,
            beta: 1.0,
            gamma: 0.0,
            eta: 0.0,
            effectiveness: 1.0,
            ..Parameters::default()
        };
        let cell = Position::new(0, 0);
        let mut population = vec![(HealthState::InfectedUnvaccinated, cell)];
        population.extend((0..5).map(|_| (HealthState::Susceptible, cell)));
        population.extend((0..5).map(|_| (HealthState::Vaccinated, cell)));
        let mut model = Model::with_population(parameters, 11, population).unwrap();

        model.step().unwrap();
        let counts = model.counts();
        assert_eq!(counts.infected_unvaccinated, 6);
        assert_eq!(counts.infected_vaccinated, 5);
    }

    #[test]
    fn two_agents_certain_transmission() {
        let parameters = Parameters {
            width: 1,
            height: 1,
            beta: 1.0,
            gamma: 0.0,
            ..Parameters::default()
        };
        let cell = Position::new(0, 0);
        for seed in 0..20 {
            let mut model = Model::with_population(
                parameters.clone(),
                seed,
                [
                    (HealthState::InfectedUnvaccinated, cell),
                    (HealthState::Susceptible, cell),
                ],
            )
            .unwrap();
            model.step().unwrap();
            assert_eq!(
                model.agent_state(AgentId::new(0)).unwrap(),
                HealthState::InfectedUnvaccinated
            );
            assert_eq!(
                model.agent_state(AgentId::new(1)).unwrap(),
                HealthState::InfectedUnvaccinated
            );
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn huge_grid_builds_and_steps() {
        let parameters = Parameters {
            width: 1 << 31,
            height: 1 << 31,
            ..parameters()
        };
        let mut model = Model::new(parameters, 0).unwrap();
        model.run(2).unwrap();
        assert_grid_consistent(&model);
    }

    #[test]
    fn unallocatable_population_is_a_configuration_error() {
        let parameters = Parameters {
            population: usize::MAX,
            vaccinated: 0,
            ..Parameters::default()
        };
        assert!(matches!(
            Model::new(parameters, 0),
            Err(SirvError::ConfigurationError(_))
        ));
    }

    #[test]
    fn no_transmission_without_contact() {
        let parameters = Parameters {
            beta: 0.0,
            gamma: 0.2,
            initial_infection_vaccinated: 0.3,
            initial_infection_susceptible: 0.3,
            ..parameters()
        };
        let mut model = Model::new(parameters, 5).unwrap();
        let ever_infected = |counts: StateCounts| counts.infected() + counts.recovered();
        let initial = ever_infected(model.counts());
        for _ in 0..30 {
            model.step().unwrap();
            assert_eq!(ever_infected(model.counts()), initial);
        }
    }

    #[test]
    fn runs_past_extinction() {
        let parameters = Parameters {
            gamma: 1.0,
            delta: 1.0,
            ..parameters()
        };
        let mut model = Model::new(parameters, 8).unwrap();
        model.run(5).unwrap();
        assert_eq!(model.counts().infected(), 0);
        model.run(5).unwrap();
        assert_eq!(model.tick(), 10);
    }
}
