//! A bounded or toroidal 2-D lattice where any number of agents may share a cell.
//!
//! The grid is the single owner of agent locations: each occupied cell keeps the list of
//! agents standing on it and a reverse index maps every placed agent back to its cell. Only
//! occupied cells are stored, so memory follows the population rather than the area. Both
//! structures are only ever mutated together by [`Grid::place_agent`] and
//! [`Grid::move_agent`], which validate their inputs before touching either index.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::SirvError;
use crate::hashing::HashMap;

/// Moore offsets in row-major order, centre first so it can be skipped cheaply.
const MOORE_OFFSETS: [(i64, i64); 9] = [
    (0, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Von Neumann offsets, centre first.
const VON_NEUMANN_OFFSETS: [(i64, i64); 5] = [(0, 0), (0, -1), (-1, 0), (1, 0), (0, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

/// How coordinates past the edge of the grid are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Coordinates wrap around modulo the grid dimensions.
    #[default]
    Torus,
    /// Coordinates outside `[0, width) x [0, height)` do not exist.
    Bounded,
}

/// The set of cells an agent can step to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// 8-connected: cardinal and diagonal cells.
    #[default]
    Moore,
    /// 4-connected: cardinal cells only.
    VonNeumann,
}

impl Neighborhood {
    fn offsets(self) -> &'static [(i64, i64)] {
        match self {
            Neighborhood::Moore => &MOORE_OFFSETS,
            Neighborhood::VonNeumann => &VON_NEUMANN_OFFSETS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    topology: Topology,
    cell_count: usize,
    /// Occupants of each non-empty cell. Order within a cell carries no meaning.
    cells: HashMap<Position, Vec<AgentId>>,
    /// Reverse index from agent to its cell.
    locations: Vec<Option<Position>>,
}

impl Grid {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::ConfigurationError` if either dimension is zero or the cell count
    /// does not fit in `usize`.
    pub fn new(width: usize, height: usize, topology: Topology) -> Result<Self, SirvError> {
        if width == 0 || height == 0 {
            return Err(SirvError::ConfigurationError(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        let cell_count = width.checked_mul(height).ok_or_else(|| {
            SirvError::ConfigurationError(format!("grid {width}x{height} is too large"))
        })?;
        Ok(Grid {
            width,
            height,
            topology,
            cell_count,
            cells: HashMap::default(),
            locations: Vec::new(),
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Number of agents currently placed.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.locations.iter().filter(|location| location.is_some()).count()
    }

    /// Maps signed coordinates onto the grid: wrapped on a torus, rejected when bounded.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::OutOfBounds` on a bounded grid when the coordinates lie outside it.
    pub fn resolve(&self, x: i64, y: i64) -> Result<Position, SirvError> {
        self.resolve_axes(x, y).ok_or(SirvError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    fn resolve_axes(&self, x: i64, y: i64) -> Option<Position> {
        let x = resolve_axis(x, self.width, self.topology)?;
        let y = resolve_axis(y, self.height, self.topology)?;
        Some(Position { x, y })
    }

    fn resolve_position(&self, position: Position) -> Result<Position, SirvError> {
        let x = i64::try_from(position.x).unwrap_or(i64::MAX);
        let y = i64::try_from(position.y).unwrap_or(i64::MAX);
        self.resolve(x, y)
    }

    /// Cells adjacent to `position` under `neighborhood`, each listed once.
    ///
    /// On a bounded grid cells past the edge are dropped. On a torus narrower than three
    /// cells several offsets wrap onto the same cell, which is then listed once; a wrapped
    /// offset that lands back on `position` counts as the centre.
    #[must_use]
    pub fn neighbors(
        &self,
        position: Position,
        neighborhood: Neighborhood,
        include_center: bool,
    ) -> Vec<Position> {
        let Ok(center) = self.resolve_position(position) else {
            return Vec::new();
        };
        let (cx, cy) = (center.x as i64, center.y as i64);
        let mut result: Vec<Position> = Vec::with_capacity(9);
        for &(dx, dy) in neighborhood.offsets() {
            let Some(candidate) = self.resolve_axes(cx + dx, cy + dy) else {
                continue;
            };
            if candidate == center && !include_center {
                continue;
            }
            if !result.contains(&candidate) {
                result.push(candidate);
            }
        }
        result
    }

    /// Agents standing on `position`.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::OutOfBounds` if `position` is not on a bounded grid.
    pub fn occupants_at(&self, position: Position) -> Result<&[AgentId], SirvError> {
        let position = self.resolve_position(position)?;
        Ok(self.cells.get(&position).map_or(&[], Vec::as_slice))
    }

    /// The cell `agent_id` stands on, if it has been placed.
    #[must_use]
    pub fn position_of(&self, agent_id: AgentId) -> Option<Position> {
        self.locations.get(agent_id.index()).copied().flatten()
    }

    /// Puts an agent on the grid for the first time.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::OutOfBounds` if `position` is not on a bounded grid, or
    /// `SirvError::SirvError` if the agent is already placed.
    pub fn place_agent(&mut self, agent_id: AgentId, position: Position) -> Result<(), SirvError> {
        let position = self.resolve_position(position)?;
        if self.position_of(agent_id).is_some() {
            return Err(SirvError::SirvError(format!(
                "agent {agent_id} is already placed"
            )));
        }
        let index = agent_id.index();
        if self.locations.len() <= index {
            self.locations.resize(index + 1, None);
        }
        self.cells.entry(position).or_default().push(agent_id);
        self.locations[index] = Some(position);
        Ok(())
    }

    /// Relocates a placed agent and returns the cell it left.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::OutOfBounds` if `new_position` is not on a bounded grid, or
    /// `SirvError::UnknownAgent` if the agent was never placed. Nothing changes on error.
    pub fn move_agent(
        &mut self,
        agent_id: AgentId,
        new_position: Position,
    ) -> Result<Position, SirvError> {
        let new_position = self.resolve_position(new_position)?;
        let old_position = self
            .position_of(agent_id)
            .ok_or(SirvError::UnknownAgent(agent_id))?;
        if old_position == new_position {
            return Ok(old_position);
        }

        let old_cell = self
            .cells
            .get_mut(&old_position)
            .ok_or(SirvError::UnknownAgent(agent_id))?;
        let slot = old_cell
            .iter()
            .position(|&occupant| occupant == agent_id)
            .ok_or(SirvError::UnknownAgent(agent_id))?;
        old_cell.swap_remove(slot);
        if old_cell.is_empty() {
            self.cells.remove(&old_position);
        }
        self.cells.entry(new_position).or_default().push(agent_id);
        self.locations[agent_id.index()] = Some(new_position);
        Ok(old_position)
    }

    /// Every occupied cell with its occupants, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, &[AgentId])> + '_ {
        let mut occupied: Vec<(Position, &[AgentId])> = self
            .cells
            .iter()
            .map(|(&position, occupants)| (position, occupants.as_slice()))
            .collect();
        occupied.sort_unstable_by_key(|(position, _)| (position.y, position.x));
        occupied.into_iter()
    }
}

fn resolve_axis(value: i64, len: usize, topology: Topology) -> Option<usize> {
    let n = i64::try_from(len).ok()?;
    if (0..n).contains(&value) {
        return usize::try_from(value).ok();
    }
    match topology {
        Topology::Bounded => None,
        Topology::Torus => usize::try_from(value.rem_euclid(n)).ok(),
    }
}
