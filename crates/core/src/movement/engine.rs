use crate::{
    config::GridConfig,
    grid::{OccupancyGrid, Occupant},
    hex::{AxialCoordinate, AxialIndexMap, AxialMap, AxialSet},
    timed,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BinaryHeap, num::NonZeroU32};

/// The cost of a single step from one cell onto an adjacent one
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCost {
    /// The step is allowed and costs this many movement points. Zero-cost
    /// steps can't be expressed, which keeps the path search heuristic
    /// admissible.
    Passable(NonZeroU32),
    /// The step can't be taken at all
    Blocked,
}

impl StepCost {
    /// A passable step with the given cost. Costs below 1 get bumped up to 1.
    pub fn passable(cost: u32) -> Self {
        Self::Passable(NonZeroU32::new(cost).unwrap_or(NonZeroU32::MIN))
    }

    /// Get the cost as a plain number, or `None` if blocked
    pub fn get(self) -> Option<u32> {
        match self {
            Self::Passable(cost) => Some(cost.get()),
            Self::Blocked => None,
        }
    }
}

/// A source of step costs. The movement engine asks this every time it
/// considers stepping from one cell onto an adjacent one. Bounds and
/// occupancy are checked separately by the engine, so implementations only
/// need to care about terrain.
pub trait TerrainCost {
    fn step_cost(
        &self,
        from: AxialCoordinate,
        to: AxialCoordinate,
        occupant: &Occupant,
    ) -> StepCost;
}

/// Any closure with the right signature can be used as a terrain source
impl<F> TerrainCost for F
where
    F: Fn(AxialCoordinate, AxialCoordinate, &Occupant) -> StepCost,
{
    fn step_cost(
        &self,
        from: AxialCoordinate,
        to: AxialCoordinate,
        occupant: &Occupant,
    ) -> StepCost {
        self(from, to, occupant)
    }
}

/// Every step costs the same
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UniformCost(NonZeroU32);

impl UniformCost {
    pub fn new(cost: u32) -> Self {
        Self(NonZeroU32::new(cost).unwrap_or(NonZeroU32::MIN))
    }
}

impl Default for UniformCost {
    fn default() -> Self {
        Self(NonZeroU32::MIN)
    }
}

impl TerrainCost for UniformCost {
    fn step_cost(
        &self,
        _: AxialCoordinate,
        _: AxialCoordinate,
        _: &Occupant,
    ) -> StepCost {
        StepCost::Passable(self.0)
    }
}

/// Per-cell terrain. Each cell has an entry cost, paid when stepping onto it,
/// or is impassable. Cells with no entry use the default cost.
#[derive(Clone, Debug, Default)]
pub struct TerrainMap {
    default: UniformCost,
    cells: AxialMap<StepCost>,
}

impl TerrainMap {
    pub fn new(default_cost: u32) -> Self {
        Self {
            default: UniformCost::new(default_cost),
            cells: AxialMap::default(),
        }
    }

    /// Set the cost of entering a cell
    pub fn set_cost(&mut self, coord: AxialCoordinate, cost: u32) {
        self.cells.insert(coord, StepCost::passable(cost));
    }

    /// Make a cell impassable, e.g. an asteroid field
    pub fn set_impassable(&mut self, coord: AxialCoordinate) {
        self.cells.insert(coord, StepCost::Blocked);
    }

    /// Reset a cell to the default cost
    pub fn clear(&mut self, coord: AxialCoordinate) {
        self.cells.remove(&coord);
    }

    /// Get the cost of stepping onto a cell
    pub fn entry_cost(&self, coord: AxialCoordinate) -> StepCost {
        self.cells
            .get(&coord)
            .copied()
            .unwrap_or(StepCost::Passable(self.default.0))
    }
}

impl TerrainCost for TerrainMap {
    fn step_cost(
        &self,
        _: AxialCoordinate,
        to: AxialCoordinate,
        _: &Occupant,
    ) -> StepCost {
        self.entry_cost(to)
    }
}

/// Is the coordinate within the grid radius? This is a pure bounds check, it
/// doesn't depend on which cells the presentation layer actually rendered.
pub fn is_valid_position(coord: AxialCoordinate, config: &GridConfig) -> bool {
    config.contains(coord)
}

/// The result of a range query: every cell an occupant can reach with its
/// budget, mapped to the cheapest cost of getting there. The start cell is
/// always included, at cost 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reachable {
    start: AxialCoordinate,
    /// Ordered by discovery, so iteration is deterministic
    costs: AxialIndexMap<u32>,
}

impl Reachable {
    pub fn start(&self) -> AxialCoordinate {
        self.start
    }

    pub fn contains(&self, coord: AxialCoordinate) -> bool {
        self.costs.contains_key(&coord)
    }

    /// Cheapest cost of reaching a cell, or `None` if it's out of range
    pub fn cost_to(&self, coord: AxialCoordinate) -> Option<u32> {
        self.costs.get(&coord).copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Iterate over every reachable cell and its cost, in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (AxialCoordinate, u32)> + '_ {
        self.costs.iter().map(|(&coord, &cost)| (coord, cost))
    }

    /// Iterate over just the reachable cells, in discovery order
    pub fn cells(&self) -> impl Iterator<Item = AxialCoordinate> + '_ {
        self.costs.keys().copied()
    }

    pub fn to_set(&self) -> AxialSet {
        self.cells().collect()
    }
}

/// A path between two cells, found by [MovementEngine::find_path]. Only the
/// engine builds these, so a path always holds at least one cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MovePath {
    /// Every cell along the path, including both the start and the end
    pub(crate) cells: Vec<AxialCoordinate>,
    /// Total movement points required to walk the path
    pub(crate) cost: u32,
}

impl MovePath {
    pub fn cells(&self) -> &[AxialCoordinate] {
        &self.cells
    }

    /// Total movement points required to walk the path
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn start(&self) -> AxialCoordinate {
        self.cells[0]
    }

    pub fn end(&self) -> AxialCoordinate {
        self.cells[self.cells.len() - 1]
    }

    /// Number of steps in the path. This is one less than the number of
    /// cells, since the start cell doesn't take a step.
    pub fn steps(&self) -> usize {
        self.cells.len() - 1
    }
}

/// An entry in the path search open set. Sorted so that the max-heap pops the
/// lowest estimated total cost first, and among equal estimates, whichever
/// was pushed first. Neighbors are pushed in [HexDirection] order, so ties
/// always resolve the same way.
///
/// [HexDirection]: crate::HexDirection
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct PathNode {
    coord: AxialCoordinate,
    /// Best known cost from the start to this cell
    g_score: u32,
    /// g + heuristic
    f_score: u32,
    /// Insertion counter, for FIFO tie breaking
    order: u64,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed, to make BinaryHeap a min-heap
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Answers movement questions (what's in range? how do I get there?) against
/// a snapshot of the grid. The engine borrows everything it needs and never
/// mutates anything, so it's cheap to build one for each query.
///
/// Queries never fail. A question with no answer (unreachable target, target
/// off the grid) gets `None` or an empty result.
#[derive(Copy, Clone)]
pub struct MovementEngine<'a> {
    config: &'a GridConfig,
    occupancy: &'a OccupancyGrid,
    terrain: &'a dyn TerrainCost,
}

impl<'a> MovementEngine<'a> {
    pub fn new(
        config: &'a GridConfig,
        occupancy: &'a OccupancyGrid,
        terrain: &'a dyn TerrainCost,
    ) -> Self {
        Self {
            config,
            occupancy,
            terrain,
        }
    }

    pub fn is_valid_position(&self, coord: AxialCoordinate) -> bool {
        is_valid_position(coord, self.config)
    }

    /// The cost for an occupant to step from one cell onto another. This only
    /// consults terrain, not bounds or occupancy.
    pub fn movement_cost(
        &self,
        from: AxialCoordinate,
        to: AxialCoordinate,
        occupant: &Occupant,
    ) -> StepCost {
        self.terrain.step_cost(from, to, occupant)
    }

    /// Can the occupant stand on this cell at all?
    fn can_enter(&self, coord: AxialCoordinate, occupant: &Occupant) -> bool {
        self.is_valid_position(coord)
            && !self.occupancy.is_occupied_by_other(coord, occupant.id())
    }

    /// Find every cell the occupant could reach from `start` while spending
    /// at most `budget` movement points.
    ///
    /// This is a Dijkstra flood fill. A cell can be reached along several
    /// routes with different costs, so whenever a cheaper arrival turns up
    /// the cell gets expanded again from the new cost. Otherwise terrain that
    /// makes the "obvious" route expensive would cut the range short.
    pub fn reachable_set(
        &self,
        start: AxialCoordinate,
        budget: u32,
        occupant: &Occupant,
    ) -> Reachable {
        timed!("Reachable set", log::Level::Trace, {
            let mut costs = AxialIndexMap::default();
            costs.insert(start, 0);
            let mut open = BinaryHeap::new();
            let mut order = 0;
            open.push(PathNode {
                coord: start,
                g_score: 0,
                f_score: 0,
                order,
            });

            while let Some(PathNode {
                coord: current,
                g_score: cost,
                ..
            }) = open.pop()
            {
                // A cheaper arrival was already expanded, this entry is stale
                if costs.get(&current).map_or(false, |&best| best < cost) {
                    continue;
                }

                for neighbor in current.neighbors() {
                    if !self.can_enter(neighbor, occupant) {
                        continue;
                    }
                    let step = match self
                        .movement_cost(current, neighbor, occupant)
                        .get()
                    {
                        Some(step) => step,
                        None => continue,
                    };
                    let new_cost = cost.saturating_add(step);
                    if new_cost > budget {
                        continue;
                    }
                    let improved = costs
                        .get(&neighbor)
                        .map_or(true, |&best| new_cost < best);
                    if improved {
                        costs.insert(neighbor, new_cost);
                        order += 1;
                        open.push(PathNode {
                            coord: neighbor,
                            g_score: new_cost,
                            f_score: new_cost,
                            order,
                        });
                    }
                }
            }

            debug!(
                "{} cells reachable from {} with budget {}",
                costs.len(),
                start,
                budget
            );
            Reachable { start, costs }
        })
    }

    /// Find the cheapest path from `start` to `end` for the given occupant,
    /// ignoring movement points. Returns `None` if the target is off the
    /// grid, held by a different occupant, or walled off.
    ///
    /// This is A*, using hex distance as the heuristic. Since every step
    /// costs at least 1, the heuristic never overestimates, so the first
    /// path to reach the target is a cheapest one.
    pub fn find_path(
        &self,
        start: AxialCoordinate,
        end: AxialCoordinate,
        occupant: &Occupant,
    ) -> Option<MovePath> {
        if !self.can_enter(end, occupant) {
            trace!("Path target {} can't be entered", end);
            return None;
        }
        if start == end {
            return Some(MovePath {
                cells: vec![start],
                cost: 0,
            });
        }

        timed!("Path search", log::Level::Trace, {
            let mut came_from: AxialMap<AxialCoordinate> = AxialMap::default();
            let mut g_scores: AxialMap<u32> = AxialMap::default();
            let mut closed = AxialSet::default();
            let mut open = BinaryHeap::new();
            let mut order = 0;

            g_scores.insert(start, 0);
            open.push(PathNode {
                coord: start,
                g_score: 0,
                f_score: start.distance_to(end),
                order,
            });

            while let Some(PathNode {
                coord: current,
                g_score,
                ..
            }) = open.pop()
            {
                if current == end {
                    let mut cells = vec![current];
                    let mut cell = current;
                    while let Some(&previous) = came_from.get(&cell) {
                        cells.push(previous);
                        cell = previous;
                    }
                    cells.reverse();
                    return Some(MovePath {
                        cells,
                        cost: g_score,
                    });
                }
                // Each cell only needs to be expanded once, the first time it
                // comes off the heap is always via its cheapest route
                if !closed.insert(current) {
                    continue;
                }

                for neighbor in current.neighbors() {
                    if closed.contains(&neighbor)
                        || !self.can_enter(neighbor, occupant)
                    {
                        continue;
                    }
                    let step = match self
                        .movement_cost(current, neighbor, occupant)
                        .get()
                    {
                        Some(step) => step,
                        None => continue,
                    };
                    let tentative = g_score.saturating_add(step);
                    let improved = g_scores
                        .get(&neighbor)
                        .map_or(true, |&best| tentative < best);
                    if improved {
                        came_from.insert(neighbor, current);
                        g_scores.insert(neighbor, tentative);
                        order += 1;
                        open.push(PathNode {
                            coord: neighbor,
                            g_score: tentative,
                            f_score: tentative
                                .saturating_add(neighbor.distance_to(end)),
                            order,
                        });
                    }
                }
            }

            debug!("No path from {} to {}", start, end);
            None
        })
    }
}
