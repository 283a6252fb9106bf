use crate::{
    config::TacticsConfig,
    error::MoveError,
    events::EventBus,
    grid::{OccupancyGrid, OccupantId},
    hex::{AxialCoordinate, PositionLookup, WorldPosition},
    movement::{
        AnimationStatus, MoveAnimation, MovePath, MovementEngine, Reachable,
        TerrainCost,
    },
};
use log::{debug, info, warn};
use serde::Serialize;

/// Everything the movement coordinator needs to borrow from the rest of the
/// game to answer a command
pub struct MovementWorld<'a> {
    pub config: &'a TacticsConfig,
    pub occupancy: &'a mut OccupancyGrid,
    pub terrain: &'a dyn TerrainCost,
}

impl<'a> MovementWorld<'a> {
    fn engine(&self) -> MovementEngine<'_> {
        MovementEngine::new(&self.config.grid, &*self.occupancy, self.terrain)
    }
}

/// State held while a unit is in movement mode
#[derive(Clone, Debug)]
pub struct MovementSession {
    unit: OccupantId,
    /// Range snapshot, taken when the session started
    reachable: Reachable,
    /// The last path the player hovered over, if any
    preview: Option<MovePath>,
}

impl MovementSession {
    pub fn unit(&self) -> OccupantId {
        self.unit
    }

    pub fn reachable(&self) -> &Reachable {
        &self.reachable
    }

    pub fn preview(&self) -> Option<&MovePath> {
        self.preview.as_ref()
    }
}

/// Published on [MovementCoordinator::events]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementEvent {
    Started {
        unit: OccupantId,
    },
    /// The set of cells the unit can reach this turn, for highlighting
    RangePreview {
        unit: OccupantId,
        cells: Vec<AxialCoordinate>,
    },
    PathPreview {
        unit: OccupantId,
        path: MovePath,
        executable: bool,
    },
    /// Only published after the move has been committed to the grid
    Completed {
        unit: OccupantId,
        from: AxialCoordinate,
        to: AxialCoordinate,
        path: MovePath,
        cost: u32,
    },
    Cancelled {
        unit: OccupantId,
    },
}

/// Result of hovering over a potential move target
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetPreview {
    pub path: MovePath,
    /// Can the unit actually make this move with its remaining points?
    pub executable: bool,
}

/// Result of a successful move
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub unit: OccupantId,
    pub from: AxialCoordinate,
    pub to: AxialCoordinate,
    pub path: MovePath,
    /// Movement points the unit has left after the move
    pub remaining_points: u32,
}

/// Drives movement mode for one unit at a time. The flow goes:
///
/// 1. [Self::start_movement] puts a unit into movement mode and previews its
///    range
/// 2. [Self::preview_target] shows the path to a hovered cell (optional,
///    any number of times)
/// 3. Either [Self::execute_movement] commits the move, or
///    [Self::cancel_movement] backs out
///
/// Only one unit can be in movement mode at a time, and a new move can't
/// start while the previous one is still animating.
#[derive(Debug, Default)]
pub struct MovementCoordinator {
    session: Option<MovementSession>,
    animation: Option<MoveAnimation>,
    events: EventBus<MovementEvent>,
}

impl MovementCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe here to hear about movement mode changes
    pub fn events(&mut self) -> &mut EventBus<MovementEvent> {
        &mut self.events
    }

    /// Is a unit in movement mode?
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&MovementSession> {
        self.session.as_ref()
    }

    /// The unit in movement mode, if any
    pub fn active_unit(&self) -> Option<OccupantId> {
        self.session.as_ref().map(|session| session.unit)
    }

    /// Is a move animation still playing?
    pub fn is_animating(&self) -> bool {
        self.animation
            .as_ref()
            .map_or(false, |animation| !animation.is_done())
    }

    pub fn animation(&self) -> Option<&MoveAnimation> {
        self.animation.as_ref()
    }

    /// Put a unit into movement mode, computing its range from its remaining
    /// movement points. Returns false and does nothing if another session is
    /// already active, an animation is playing, or the unit isn't on the
    /// grid.
    pub fn start_movement(
        &mut self,
        unit: OccupantId,
        world: &MovementWorld,
    ) -> bool {
        if let Some(session) = &self.session {
            debug!(
                "Can't start movement for {}, {} is already moving",
                unit, session.unit
            );
            return false;
        }
        if self.is_animating() {
            debug!("Can't start movement for {} during an animation", unit);
            return false;
        }
        let occupant = match world.occupancy.get(unit) {
            Some(occupant) => occupant,
            None => {
                warn!("Can't start movement for {}, it's not on the grid", unit);
                return false;
            }
        };

        let reachable = world.engine().reachable_set(
            occupant.position(),
            occupant.movement_points(),
            occupant,
        );
        debug!(
            "Movement started for {} at {} with {} points",
            unit,
            occupant.position(),
            occupant.movement_points()
        );
        let cells = reachable.cells().collect();
        self.session = Some(MovementSession {
            unit,
            reachable,
            preview: None,
        });
        self.events.publish(&MovementEvent::Started { unit });
        self.events
            .publish(&MovementEvent::RangePreview { unit, cells });
        true
    }

    /// Find the path to a potential target for the active unit, and remember
    /// it as the current preview. Returns `None` if no unit is in movement
    /// mode or no path exists. A path can exist but not be executable, if
    /// the unit doesn't have enough points left to walk it.
    pub fn preview_target(
        &mut self,
        target: AxialCoordinate,
        world: &MovementWorld,
    ) -> Option<TargetPreview> {
        let session = self.session.as_mut()?;
        let occupant = world.occupancy.get(session.unit)?;
        let start = occupant.position();
        let path = match world.engine().find_path(start, target, occupant) {
            Some(path) => path,
            None => {
                session.preview = None;
                return None;
            }
        };

        let executable = target != start && session.reachable.contains(target);
        session.preview = Some(path.clone());
        let unit = session.unit;
        self.events.publish(&MovementEvent::PathPreview {
            unit,
            path: path.clone(),
            executable,
        });
        Some(TargetPreview { path, executable })
    }

    /// Move the active unit to a target cell. Everything is re-validated
    /// against the current state of the grid, since it may have changed
    /// since the range was previewed. On success the unit's position and
    /// movement points are updated, movement mode ends, and an animation
    /// starts playing. On failure, nothing changes and the unit stays in
    /// movement mode.
    pub fn execute_movement(
        &mut self,
        target: AxialCoordinate,
        world: &mut MovementWorld,
        lookup: &dyn PositionLookup,
    ) -> Result<MoveOutcome, MoveError> {
        let result = self.try_execute(target, world, lookup);
        if let Err(error) = &result {
            warn!("Rejected move to {}: {}", target, error);
        }
        result
    }

    fn try_execute(
        &mut self,
        target: AxialCoordinate,
        world: &mut MovementWorld,
        lookup: &dyn PositionLookup,
    ) -> Result<MoveOutcome, MoveError> {
        let unit = self
            .active_unit()
            .ok_or_else(|| MoveError::invalid_state("no unit is in movement mode"))?;
        let occupant = world.occupancy.get(unit).cloned().ok_or_else(|| {
            MoveError::invalid_state(format!("unit {} is not on the grid", unit))
        })?;
        let from = occupant.position();

        if target == from {
            return Err(MoveError::invalid_state(format!(
                "unit {} is already at {}",
                unit, target
            )));
        }
        if !world.config.grid.contains(target) {
            return Err(MoveError::OutOfBounds { coord: target });
        }
        if let Some(other) = world.occupancy.occupant_id_at(target) {
            return Err(MoveError::Occupied {
                coord: target,
                occupant: other,
            });
        }
        let path = world
            .engine()
            .find_path(from, target, &occupant)
            .ok_or(MoveError::NoPath { from, to: target })?;
        if path.cost > occupant.movement_points() {
            return Err(MoveError::InsufficientBudget {
                required: path.cost,
                available: occupant.movement_points(),
            });
        }

        // Everything was checked above, so neither of these can fail
        world.occupancy.move_occupant(unit, from, target)?;
        let remaining_points =
            world.occupancy.spend_movement_points(unit, path.cost)?;
        info!(
            "{} moved from {} to {} for {} points ({} left)",
            unit, from, target, path.cost, remaining_points
        );

        self.events.publish(&MovementEvent::Completed {
            unit,
            from,
            to: target,
            path: path.clone(),
            cost: path.cost,
        });
        self.session = None;
        self.animation = Some(MoveAnimation::new(
            unit,
            &path,
            &world.config.grid,
            &world.config.animation,
            lookup,
        ));

        Ok(MoveOutcome {
            unit,
            from,
            to: target,
            path,
            remaining_points,
        })
    }

    /// Leave movement mode without moving. Returns false if no unit was in
    /// movement mode.
    pub fn cancel_movement(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                debug!("Movement cancelled for {}", session.unit);
                self.events
                    .publish(&MovementEvent::Cancelled { unit: session.unit });
                true
            }
            None => false,
        }
    }

    /// Step the current animation forward, if there is one. Once the
    /// animation finishes it gets dropped, so this returns `None` on
    /// subsequent calls.
    pub fn tick(&mut self, dt: f64) -> Option<AnimationStatus> {
        let status = self.animation.as_mut()?.advance(dt);
        if status == AnimationStatus::Done {
            self.animation = None;
        }
        Some(status)
    }

    /// Cut the current animation short, snapping the unit to its
    /// destination. Returns where the unit ended up, or `None` if nothing
    /// was animating.
    pub fn skip_animation(&mut self) -> Option<WorldPosition> {
        let mut animation = self.animation.take()?;
        animation.cancel();
        debug!(
            "Skipped animation for {}, snapped to {}",
            animation.unit(),
            animation.displayed_position()
        );
        Some(animation.displayed_position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GridConfig,
        grid::Occupant,
        hex::{axial_to_world, GridLayout},
        movement::{TerrainMap, UniformCost},
    };
    use std::{cell::RefCell, rc::Rc};

    fn coord(q: i32, r: i32) -> AxialCoordinate {
        AxialCoordinate::new(q, r)
    }

    fn config() -> TacticsConfig {
        TacticsConfig {
            grid: GridConfig {
                hex_size: 1.0,
                grid_radius: 3,
            },
            ..Default::default()
        }
    }

    /// Unit #1 at the origin with 3 points, unit #2 at (0, 2)
    fn occupancy() -> OccupancyGrid {
        let mut occupancy = OccupancyGrid::new();
        occupancy
            .register(Occupant::new(1, 3), AxialCoordinate::ORIGIN)
            .unwrap();
        occupancy.register(Occupant::new(2, 3), coord(0, 2)).unwrap();
        occupancy
    }

    fn record(
        coordinator: &mut MovementCoordinator,
    ) -> Rc<RefCell<Vec<MovementEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        coordinator
            .events()
            .subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn test_start_movement() {
        let config = config();
        let mut occupancy = occupancy();
        let terrain = UniformCost::default();
        let world = MovementWorld {
            config: &config,
            occupancy: &mut occupancy,
            terrain: &terrain,
        };
        let mut coordinator = MovementCoordinator::new();
        let events = record(&mut coordinator);

        assert!(!coordinator.start_movement(OccupantId(9), &world));
        assert!(coordinator.start_movement(OccupantId(1), &world));
        assert_eq!(coordinator.active_unit(), Some(OccupantId(1)));
        // Second start is rejected, even for a different unit
        assert!(!coordinator.start_movement(OccupantId(2), &world));
        assert_eq!(coordinator.active_unit(), Some(OccupantId(1)));

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], MovementEvent::Started {
            unit: OccupantId(1)
        });
        match &events[1] {
            MovementEvent::RangePreview { unit, cells } => {
                assert_eq!(*unit, OccupantId(1));
                // Radius 3 grid minus the other unit's cell, and the cell
                // behind it which is now 4 steps away
                assert_eq!(cells.len(), 35);
                assert!(!cells.contains(&coord(0, 2)));
                assert!(!cells.contains(&coord(0, 3)));
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_preview_target() {
        let config = config();
        let mut occupancy = occupancy();
        occupancy
            .spend_movement_points(OccupantId(1), 2)
            .unwrap();
        let terrain = UniformCost::default();
        let world = MovementWorld {
            config: &config,
            occupancy: &mut occupancy,
            terrain: &terrain,
        };
        let mut coordinator = MovementCoordinator::new();
        assert_eq!(coordinator.preview_target(coord(1, 0), &world), None);

        coordinator.start_movement(OccupantId(1), &world);
        let preview = coordinator.preview_target(coord(1, 0), &world).unwrap();
        assert!(preview.executable);
        assert_eq!(preview.path.cost, 1);

        // Path exists, but the unit only has 1 point left
        let preview = coordinator.preview_target(coord(2, 0), &world).unwrap();
        assert!(!preview.executable);
        assert_eq!(
            coordinator.session().unwrap().preview(),
            Some(&preview.path)
        );

        // Occupied
        assert_eq!(coordinator.preview_target(coord(0, 2), &world), None);
        assert_eq!(coordinator.session().unwrap().preview(), None);
    }

    #[test]
    fn test_execute_movement() {
        let config = config();
        let mut occupancy = occupancy();
        let terrain = UniformCost::default();
        let lookup = GridLayout::new(config.grid);
        let mut coordinator = MovementCoordinator::new();
        let events = record(&mut coordinator);

        {
            let mut world = MovementWorld {
                config: &config,
                occupancy: &mut occupancy,
                terrain: &terrain,
            };
            coordinator.start_movement(OccupantId(1), &world);
            let outcome = coordinator
                .execute_movement(coord(2, 0), &mut world, &lookup)
                .unwrap();
            assert_eq!(outcome.from, AxialCoordinate::ORIGIN);
            assert_eq!(outcome.to, coord(2, 0));
            assert_eq!(outcome.remaining_points, 1);
        }

        assert!(!coordinator.is_active());
        assert!(coordinator.is_animating());
        let unit = occupancy.get(OccupantId(1)).unwrap();
        assert_eq!(unit.position(), coord(2, 0));
        assert_eq!(unit.movement_points(), 1);
        assert!(occupancy.is_consistent());
        assert_eq!(events.borrow().last(), Some(&MovementEvent::Completed {
            unit: OccupantId(1),
            from: AxialCoordinate::ORIGIN,
            to: coord(2, 0),
            path: MovePath {
                cells: vec![AxialCoordinate::ORIGIN, coord(1, 0), coord(2, 0)],
                cost: 2,
            },
            cost: 2,
        }));

        // Can't start again until the animation is done
        let world = MovementWorld {
            config: &config,
            occupancy: &mut occupancy,
            terrain: &terrain,
        };
        assert!(!coordinator.start_movement(OccupantId(1), &world));
        let mut status = coordinator.tick(0.0);
        while status == Some(AnimationStatus::InProgress) {
            status = coordinator.tick(0.1);
        }
        assert_eq!(status, Some(AnimationStatus::Done));
        assert_eq!(coordinator.tick(0.1), None);
        assert!(coordinator.start_movement(OccupantId(1), &world));
    }

    #[test]
    fn test_execute_rejected() {
        let config = config();
        let mut occupancy = occupancy();
        occupancy
            .spend_movement_points(OccupantId(1), 1)
            .unwrap();
        let mut terrain = TerrainMap::new(1);
        terrain.set_impassable(coord(-3, 3));
        let lookup = GridLayout::new(config.grid);
        let mut coordinator = MovementCoordinator::new();
        let mut world = MovementWorld {
            config: &config,
            occupancy: &mut occupancy,
            terrain: &terrain,
        };

        // Not in movement mode
        assert!(matches!(
            coordinator.execute_movement(coord(1, 0), &mut world, &lookup),
            Err(MoveError::InvalidState { .. })
        ));

        coordinator.start_movement(OccupantId(1), &world);
        assert!(matches!(
            coordinator.execute_movement(
                AxialCoordinate::ORIGIN,
                &mut world,
                &lookup
            ),
            Err(MoveError::InvalidState { .. })
        ));
        assert_eq!(
            coordinator.execute_movement(coord(4, 0), &mut world, &lookup),
            Err(MoveError::OutOfBounds { coord: coord(4, 0) })
        );
        assert_eq!(
            coordinator.execute_movement(coord(0, 2), &mut world, &lookup),
            Err(MoveError::Occupied {
                coord: coord(0, 2),
                occupant: OccupantId(2)
            })
        );
        assert_eq!(
            coordinator.execute_movement(coord(-3, 3), &mut world, &lookup),
            Err(MoveError::NoPath {
                from: AxialCoordinate::ORIGIN,
                to: coord(-3, 3)
            })
        );
        assert_eq!(
            coordinator.execute_movement(coord(3, -3), &mut world, &lookup),
            Err(MoveError::InsufficientBudget {
                required: 3,
                available: 2
            })
        );

        // None of that changed anything
        assert_eq!(coordinator.active_unit(), Some(OccupantId(1)));
        assert!(!coordinator.is_animating());
        let unit = world.occupancy.get(OccupantId(1)).unwrap();
        assert_eq!(unit.position(), AxialCoordinate::ORIGIN);
        assert_eq!(unit.movement_points(), 2);
    }

    #[test]
    fn test_skip_animation() {
        let config = config();
        let mut occupancy = occupancy();
        let terrain = UniformCost::default();
        let lookup = GridLayout::new(config.grid);
        let mut world = MovementWorld {
            config: &config,
            occupancy: &mut occupancy,
            terrain: &terrain,
        };
        let mut coordinator = MovementCoordinator::new();
        let events = record(&mut coordinator);

        assert_eq!(coordinator.skip_animation(), None);

        coordinator.start_movement(OccupantId(1), &world);
        coordinator
            .execute_movement(coord(2, 0), &mut world, &lookup)
            .unwrap();
        assert!(coordinator.is_animating());
        let published = events.borrow().len();

        assert_eq!(
            coordinator.skip_animation(),
            Some(axial_to_world(coord(2, 0), config.grid.hex_size))
        );
        assert!(!coordinator.is_animating());
        assert!(coordinator.animation().is_none());
        assert_eq!(coordinator.tick(0.1), None);
        // The move was announced when it was committed, skipping the
        // visuals doesn't publish anything new
        assert_eq!(events.borrow().len(), published);
        assert!(matches!(
            events.borrow().last(),
            Some(MovementEvent::Completed { to, .. }) if *to == coord(2, 0)
        ));

        // Free to move again right away
        assert!(coordinator.start_movement(OccupantId(1), &world));
    }

    #[test]
    fn test_cancel_movement() {
        let config = config();
        let mut occupancy = occupancy();
        let terrain = UniformCost::default();
        let world = MovementWorld {
            config: &config,
            occupancy: &mut occupancy,
            terrain: &terrain,
        };
        let mut coordinator = MovementCoordinator::new();
        let events = record(&mut coordinator);

        assert!(!coordinator.cancel_movement());
        assert!(events.borrow().is_empty());

        coordinator.start_movement(OccupantId(1), &world);
        coordinator.preview_target(coord(1, 0), &world);
        assert!(coordinator.cancel_movement());
        assert!(!coordinator.is_active());
        assert_eq!(events.borrow().last(), Some(&MovementEvent::Cancelled {
            unit: OccupantId(1)
        }));
    }
}
