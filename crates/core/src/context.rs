use crate::{
    config::TacticsConfig,
    error::MoveError,
    events::EventBus,
    grid::{OccupancyGrid, Occupant, OccupantId},
    hex::{AxialCoordinate, GridLayout, PositionLookup, WorldPosition},
    movement::{
        AnimationStatus, MoveOutcome, MovementCoordinator, MovementEvent,
        MovementWorld, TargetPreview, TerrainCost, UniformCost,
    },
    selection::{
        MouseButton, Selectable, SelectionContext, SelectionCoordinator,
        SelectionEvent,
    },
};
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// The game-side data for a unit. Where the unit stands and how far it can
/// move live in the [OccupancyGrid]; this holds everything else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    /// Player that controls this unit
    pub owner: u32,
    /// Can the player select this unit? Units that can't be selected veto
    /// every selection attempt.
    #[serde(default = "default_selectable")]
    pub selectable: bool,
    /// Tracks whether the unit thinks it's selected, based on the
    /// notifications it's received
    #[serde(skip)]
    selected: bool,
}

fn default_selectable() -> bool {
    true
}

impl Unit {
    pub fn new(name: impl Into<String>, owner: u32) -> Self {
        Self {
            name: name.into(),
            owner,
            selectable: true,
            selected: false,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

impl Selectable for Unit {
    fn accept_select(&mut self, _: &SelectionContext) -> bool {
        if self.selectable {
            self.selected = true;
        }
        self.selectable
    }

    fn accept_deselect(&mut self) -> bool {
        self.selected = false;
        true
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// What happened as a result of [Tactics::handle_click]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click didn't land on anything actionable
    Ignored,
    /// A unit was clicked and a select was attempted. `focused` is false if
    /// the unit vetoed.
    Selected { unit: OccupantId, focused: bool },
    /// A unit was clicked with the alternate modifier held
    Toggled { unit: OccupantId, selected: bool },
    Moved(MoveOutcome),
    /// A move was attempted but couldn't be made
    Rejected(MoveError),
    /// Movement mode was cancelled
    Cancelled,
}

/// Serializable summary of the game state, for hosts that want to display
/// or record it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub turn: u32,
    pub units: Vec<UnitSnapshot>,
    pub current: Option<OccupantId>,
    pub selected: Vec<OccupantId>,
    /// Unit in movement mode, if any
    pub moving: Option<OccupantId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitSnapshot {
    pub id: OccupantId,
    pub name: String,
    pub owner: u32,
    pub position: AxialCoordinate,
    pub movement_points: u32,
    pub max_movement_points: u32,
}

impl Snapshot {
    /// Serialize the snapshot as pretty-printed JSON
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        serde_json::to_string_pretty(self).context("error serializing snapshot")
    }
}

/// A full tactics session: the grid, the units on it, the terrain, and the
/// selection and movement state machines. Everything the core knows about
/// lives in here, so there's no global state. Build one, feed it input,
/// and subscribe to its events.
///
/// ```
/// use hexfleet::{AxialCoordinate, OccupantId, SelectionContext, Tactics, TacticsConfig, Unit};
///
/// let mut tactics = Tactics::new(TacticsConfig::default()).unwrap();
/// tactics
///     .deploy(OccupantId(1), Unit::new("Corvette", 0), AxialCoordinate::ORIGIN, 3)
///     .unwrap();
/// tactics.select(OccupantId(1), &SelectionContext::default());
/// tactics.start_movement();
/// let layout = tactics.layout();
/// tactics.execute_movement(AxialCoordinate::new(2, 0), &layout).unwrap();
/// ```
pub struct Tactics {
    config: TacticsConfig,
    turn: u32,
    occupancy: OccupancyGrid,
    terrain: Box<dyn TerrainCost>,
    units: IndexMap<OccupantId, Unit, FnvBuildHasher>,
    selection: SelectionCoordinator<OccupantId>,
    movement: MovementCoordinator,
}

impl Tactics {
    /// Start a new session on an empty grid, with uniform terrain. The
    /// config is validated first.
    pub fn new(config: TacticsConfig) -> anyhow::Result<Self> {
        let config = config.validated()?;
        info!("Starting tactics session with config {:?}", config);
        Ok(Self {
            terrain: Box::new(UniformCost::new(config.default_step_cost)),
            config,
            turn: 1,
            occupancy: OccupancyGrid::new(),
            units: IndexMap::default(),
            selection: SelectionCoordinator::new(),
            movement: MovementCoordinator::new(),
        })
    }

    /// Replace the terrain cost source
    pub fn with_terrain(mut self, terrain: impl TerrainCost + 'static) -> Self {
        self.terrain = Box::new(terrain);
        self
    }

    pub fn config(&self) -> &TacticsConfig {
        &self.config
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn occupancy(&self) -> &OccupancyGrid {
        &self.occupancy
    }

    pub fn terrain(&self) -> &dyn TerrainCost {
        self.terrain.as_ref()
    }

    pub fn unit(&self, id: OccupantId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = (OccupantId, &Unit)> {
        self.units.iter().map(|(&id, unit)| (id, unit))
    }

    pub fn selection(&self) -> &SelectionCoordinator<OccupantId> {
        &self.selection
    }

    pub fn movement(&self) -> &MovementCoordinator {
        &self.movement
    }

    pub fn selection_events(
        &mut self,
    ) -> &mut EventBus<SelectionEvent<OccupantId>> {
        self.selection.events()
    }

    pub fn movement_events(&mut self) -> &mut EventBus<MovementEvent> {
        self.movement.events()
    }

    /// A position lookup that covers every cell on the grid. Hosts that
    /// render cells themselves should pass their own lookup instead.
    pub fn layout(&self) -> GridLayout {
        GridLayout::new(self.config.grid)
    }

    /// Place a new unit on the grid, with a full movement budget
    pub fn deploy(
        &mut self,
        id: OccupantId,
        unit: Unit,
        at: AxialCoordinate,
        max_movement_points: u32,
    ) -> Result<(), MoveError> {
        if !self.config.grid.contains(at) {
            return Err(MoveError::OutOfBounds { coord: at });
        }
        self.occupancy
            .register(Occupant::new(id, max_movement_points), at)?;
        info!("Deployed {} ({}) at {}", unit.name, id, at);
        self.units.insert(id, unit);
        Ok(())
    }

    /// Take a unit off the board, e.g. because it was destroyed. It drops
    /// out of the selection, out of movement mode if it was in it, and any
    /// animation of its last move is stopped.
    pub fn remove_unit(&mut self, id: OccupantId) -> Option<Unit> {
        let unit = self.units.shift_remove(&id)?;
        self.occupancy.unregister(id);
        if self.movement.active_unit() == Some(id) {
            self.movement.cancel_movement();
        }
        if self.movement.animation().map(|animation| animation.unit())
            == Some(id)
        {
            self.movement.skip_animation();
        }
        self.selection.prune(&self.units);
        info!("Removed {} ({})", unit.name, id);
        Some(unit)
    }

    /// See [SelectionCoordinator::select]
    pub fn select(&mut self, id: OccupantId, context: &SelectionContext) -> bool {
        let focused = self.selection.select(id, context, &mut self.units);
        self.sync_movement();
        focused
    }

    /// See [SelectionCoordinator::toggle]
    pub fn toggle(&mut self, id: OccupantId, context: &SelectionContext) -> bool {
        let selected = self.selection.toggle(id, context, &mut self.units);
        self.sync_movement();
        selected
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.units);
        self.sync_movement();
    }

    /// Movement mode belongs to the focused unit. If focus moves anywhere
    /// else, movement mode ends.
    fn sync_movement(&mut self) {
        if let Some(active) = self.movement.active_unit() {
            if self.selection.current() != Some(&active) {
                debug!("Focus moved away from {}, cancelling movement", active);
                self.movement.cancel_movement();
            }
        }
    }

    /// Put the focused unit into movement mode. Returns false if nothing is
    /// focused, or movement mode couldn't start.
    pub fn start_movement(&mut self) -> bool {
        let unit = match self.selection.current() {
            Some(&unit) => unit,
            None => {
                debug!("Can't start movement, nothing is selected");
                return false;
            }
        };
        let world = MovementWorld {
            config: &self.config,
            occupancy: &mut self.occupancy,
            terrain: self.terrain.as_ref(),
        };
        self.movement.start_movement(unit, &world)
    }

    /// Leave movement mode if it's active, otherwise enter it for the
    /// focused unit. Returns whether movement mode is active afterwards.
    pub fn toggle_movement_mode(&mut self) -> bool {
        if self.movement.is_active() {
            self.movement.cancel_movement();
            false
        } else {
            self.start_movement()
        }
    }

    /// See [MovementCoordinator::preview_target]
    pub fn preview_target(
        &mut self,
        target: AxialCoordinate,
    ) -> Option<TargetPreview> {
        let world = MovementWorld {
            config: &self.config,
            occupancy: &mut self.occupancy,
            terrain: self.terrain.as_ref(),
        };
        self.movement.preview_target(target, &world)
    }

    /// See [MovementCoordinator::execute_movement]
    pub fn execute_movement(
        &mut self,
        target: AxialCoordinate,
        lookup: &dyn PositionLookup,
    ) -> Result<MoveOutcome, MoveError> {
        let mut world = MovementWorld {
            config: &self.config,
            occupancy: &mut self.occupancy,
            terrain: self.terrain.as_ref(),
        };
        self.movement.execute_movement(target, &mut world, lookup)
    }

    pub fn cancel_movement(&mut self) -> bool {
        self.movement.cancel_movement()
    }

    /// Route a resolved click. In movement mode, a left click on a cell tries
    /// to move there and a right click cancels. Otherwise, a left click on a
    /// unit selects it (or toggles it, if the alternate modifier is held).
    pub fn handle_click(
        &mut self,
        context: &SelectionContext,
        lookup: &dyn PositionLookup,
    ) -> ClickOutcome {
        if self.movement.is_active() {
            return match (context.button, context.axial) {
                (MouseButton::Right, _) => {
                    self.cancel_movement();
                    ClickOutcome::Cancelled
                }
                (MouseButton::Left, Some(target)) => {
                    self.preview_target(target);
                    match self.execute_movement(target, lookup) {
                        Ok(outcome) => ClickOutcome::Moved(outcome),
                        Err(error) => ClickOutcome::Rejected(error),
                    }
                }
                _ => ClickOutcome::Ignored,
            };
        }

        if context.button != MouseButton::Left {
            return ClickOutcome::Ignored;
        }
        let unit = match context
            .axial
            .and_then(|coord| self.occupancy.occupant_id_at(coord))
        {
            Some(unit) => unit,
            None => return ClickOutcome::Ignored,
        };
        if context.modifiers.alternate {
            let selected = self.toggle(unit, context);
            ClickOutcome::Toggled { unit, selected }
        } else {
            let focused = self.select(unit, context);
            ClickOutcome::Selected { unit, focused }
        }
    }

    /// Advance to the next turn. Every unit gets its movement points back,
    /// and any unit still in movement mode leaves it.
    pub fn end_turn(&mut self) {
        self.movement.cancel_movement();
        self.occupancy.refresh_movement_points();
        self.turn += 1;
        info!("Starting turn {}", self.turn);
    }

    /// Step the movement animation, if one is playing
    pub fn tick(&mut self, dt: f64) -> Option<AnimationStatus> {
        self.movement.tick(dt)
    }

    /// See [MovementCoordinator::skip_animation]
    pub fn skip_animation(&mut self) -> Option<WorldPosition> {
        self.movement.skip_animation()
    }

    pub fn snapshot(&self) -> Snapshot {
        let units = self
            .units
            .iter()
            .filter_map(|(&id, unit)| {
                let occupant = self.occupancy.get(id)?;
                Some(UnitSnapshot {
                    id,
                    name: unit.name.clone(),
                    owner: unit.owner,
                    position: occupant.position(),
                    movement_points: occupant.movement_points(),
                    max_movement_points: occupant.max_movement_points(),
                })
            })
            .collect();
        Snapshot {
            turn: self.turn,
            units,
            current: self.selection.current().copied(),
            selected: self.selection.selected().copied().collect(),
            moving: self.movement.active_unit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GridConfig, hex::axial_to_world};

    fn coord(q: i32, r: i32) -> AxialCoordinate {
        AxialCoordinate::new(q, r)
    }

    /// Radius 3 grid with two friendly units
    fn tactics() -> Tactics {
        let config = TacticsConfig {
            grid: GridConfig {
                hex_size: 1.0,
                grid_radius: 3,
            },
            ..Default::default()
        };
        let mut tactics = Tactics::new(config).unwrap();
        tactics
            .deploy(OccupantId(1), Unit::new("Alpha", 0), coord(0, 0), 3)
            .unwrap();
        tactics
            .deploy(OccupantId(2), Unit::new("Bravo", 0), coord(-1, 0), 2)
            .unwrap();
        tactics
    }

    fn click_on(tactics: &Tactics, target: AxialCoordinate) -> SelectionContext {
        let point = axial_to_world(target, tactics.config().grid.hex_size);
        SelectionContext::resolve(point, &tactics.config().grid, &tactics.layout())
    }

    #[test]
    fn test_deploy() {
        let mut tactics = tactics();
        assert_eq!(
            tactics.deploy(OccupantId(3), Unit::new("C", 1), coord(4, 0), 2),
            Err(MoveError::OutOfBounds { coord: coord(4, 0) })
        );
        assert_eq!(
            tactics.deploy(OccupantId(3), Unit::new("C", 1), coord(-1, 0), 2),
            Err(MoveError::Occupied {
                coord: coord(-1, 0),
                occupant: OccupantId(2)
            })
        );
        assert!(tactics.unit(OccupantId(3)).is_none());
        assert_eq!(tactics.occupancy().len(), 2);
    }

    #[test]
    fn test_focus_change_cancels_movement() {
        let mut tactics = tactics();
        let context = SelectionContext::default();
        tactics.select(OccupantId(1), &context);
        assert!(tactics.unit(OccupantId(1)).unwrap().is_selected());
        assert!(tactics.start_movement());
        assert_eq!(tactics.movement().active_unit(), Some(OccupantId(1)));

        tactics.select(OccupantId(2), &context);
        assert!(!tactics.movement().is_active());
        assert!(!tactics.unit(OccupantId(1)).unwrap().is_selected());

        // Re-focusing the active unit keeps movement mode, focusing another
        // unit additively doesn't
        let additive = context.clone().additive(true);
        assert!(tactics.start_movement());
        tactics.select(OccupantId(2), &additive);
        assert_eq!(tactics.movement().active_unit(), Some(OccupantId(2)));
        tactics.select(OccupantId(1), &additive);
        assert!(!tactics.movement().is_active());
        assert_eq!(tactics.selection().len(), 2);
    }

    #[test]
    fn test_handle_click() {
        let mut tactics = tactics();
        let layout = tactics.layout();

        // Empty cell, nothing happens
        let context = click_on(&tactics, coord(2, 0));
        assert_eq!(tactics.handle_click(&context, &layout), ClickOutcome::Ignored);

        let context = click_on(&tactics, coord(0, 0));
        assert_eq!(
            tactics.handle_click(&context, &layout),
            ClickOutcome::Selected {
                unit: OccupantId(1),
                focused: true
            }
        );
        assert!(tactics.toggle_movement_mode());

        // Onto the other unit
        let context = click_on(&tactics, coord(-1, 0));
        assert!(matches!(
            tactics.handle_click(&context, &layout),
            ClickOutcome::Rejected(MoveError::Occupied { .. })
        ));
        assert!(tactics.movement().is_active());

        let context = click_on(&tactics, coord(2, 0));
        match tactics.handle_click(&context, &layout) {
            ClickOutcome::Moved(outcome) => {
                assert_eq!(outcome.to, coord(2, 0));
                assert_eq!(outcome.remaining_points, 1);
            }
            other => panic!("Unexpected outcome {:?}", other),
        }
        assert_eq!(
            tactics.occupancy().get(OccupantId(1)).unwrap().position(),
            coord(2, 0)
        );
        assert!(!tactics.movement().is_active());

        // Right click cancels
        while tactics.tick(0.1) == Some(AnimationStatus::InProgress) {}
        assert!(tactics.start_movement());
        let context = click_on(&tactics, coord(0, 0)).button(MouseButton::Right);
        assert_eq!(
            tactics.handle_click(&context, &layout),
            ClickOutcome::Cancelled
        );
        assert!(!tactics.movement().is_active());
    }

    #[test]
    fn test_end_turn() {
        let mut tactics = tactics();
        let layout = tactics.layout();
        tactics.select(OccupantId(2), &SelectionContext::default());
        tactics.start_movement();
        tactics.execute_movement(coord(-2, 0), &layout).unwrap();
        assert_eq!(
            tactics.occupancy().get(OccupantId(2)).unwrap().movement_points(),
            1
        );

        tactics.end_turn();
        assert_eq!(tactics.turn(), 2);
        assert_eq!(
            tactics.occupancy().get(OccupantId(2)).unwrap().movement_points(),
            2
        );
    }

    #[test]
    fn test_remove_unit() {
        let mut tactics = tactics();
        let context = SelectionContext::default().additive(true);
        tactics.select(OccupantId(1), &context);
        tactics.select(OccupantId(2), &context);
        tactics.start_movement();

        let removed = tactics.remove_unit(OccupantId(2)).unwrap();
        assert_eq!(removed.name, "Bravo");
        assert!(!tactics.movement().is_active());
        assert_eq!(
            tactics.selection().selected().copied().collect::<Vec<_>>(),
            vec![OccupantId(1)]
        );
        assert_eq!(tactics.selection().current(), None);
        assert!(!tactics.occupancy().is_occupied(coord(-1, 0)));
    }

    #[test]
    fn test_remove_unit_while_animating() {
        let mut tactics = tactics();
        let layout = tactics.layout();
        tactics.select(OccupantId(1), &SelectionContext::default());
        tactics.start_movement();
        tactics.execute_movement(coord(2, 0), &layout).unwrap();
        assert!(tactics.movement().is_animating());

        // Removing some other unit leaves the animation alone
        tactics.remove_unit(OccupantId(2)).unwrap();
        assert!(tactics.movement().is_animating());

        tactics.remove_unit(OccupantId(1)).unwrap();
        assert!(!tactics.movement().is_animating());
        assert!(tactics.movement().animation().is_none());
        assert_eq!(tactics.tick(0.1), None);
    }

    #[test]
    fn test_skip_animation() {
        let mut tactics = tactics();
        let layout = tactics.layout();
        assert_eq!(tactics.skip_animation(), None);

        tactics.select(OccupantId(1), &SelectionContext::default());
        tactics.start_movement();
        tactics.execute_movement(coord(2, 0), &layout).unwrap();
        assert_eq!(
            tactics.skip_animation(),
            Some(axial_to_world(coord(2, 0), tactics.config().grid.hex_size))
        );
        assert!(!tactics.movement().is_animating());
        assert_eq!(
            tactics.occupancy().get(OccupantId(1)).unwrap().position(),
            coord(2, 0)
        );
        // No need to tick it out before moving again
        assert!(tactics.start_movement());
    }

    #[test]
    fn test_snapshot() {
        let mut tactics = tactics();
        tactics.select(OccupantId(1), &SelectionContext::default());
        let snapshot = tactics.snapshot();
        assert_eq!(snapshot.turn, 1);
        assert_eq!(snapshot.units.len(), 2);
        assert_eq!(snapshot.units[1].position, coord(-1, 0));
        assert_eq!(snapshot.current, Some(OccupantId(1)));
        assert_eq!(snapshot.selected, vec![OccupantId(1)]);
        assert_eq!(snapshot.moving, None);
    }
}
