//! An agent-based SIRV (Susceptible, Infected, Recovered, Vaccinated) epidemic simulation
//! on a two-dimensional grid.
//!
//! A [`Model`](model::Model) owns a fixed population of agents, a rectangular [`Grid`]
//! (toroidal by default) and a set of seeded random number streams. Each call to
//! [`Model::step`](model::Model::step) is one tick: every agent is activated exactly once in
//! a fresh random order and, when activated,
//! * recovers with its per-tick recovery probability, if infected
//! * moves to a random neighboring cell
//! * attempts to infect every agent sharing its new cell
//!
//! Infections take effect immediately, so an agent infected earlier in a tick can infect
//! others later in the same tick.
//!
//! Everything stochastic draws from named streams derived from one base seed, so a model is
//! fully reproducible from its [`Parameters`] and seed.
//!
//! ```rust
//! use sirv::{Model, Parameters};
//!
//! let mut model = Model::new(Parameters::default(), 42).unwrap();
//! model.run(10).unwrap();
//! assert_eq!(model.counts().total(), model.population());
//! ```
pub mod agent;
pub mod error;
pub mod grid;
pub mod hashing;
pub mod log;
pub mod model;
pub mod parameters;
pub mod random;
pub mod runner;
pub mod scheduler;
pub mod snapshot;

pub use agent::{AgentId, HealthState, ModelAgentExt};
pub use error::SirvError;
pub use grid::{Grid, Neighborhood, Position, Topology};
pub use model::Model;
pub use parameters::Parameters;
pub use random::{ContextRandomExt, RngId};
pub use snapshot::{StateCounts, TickSnapshot};

// Referenced by `define_rng!` expansions.
pub use paste;
pub use rand;
