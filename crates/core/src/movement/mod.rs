//! Unit movement: range and path queries ([MovementEngine]), the movement
//! mode state machine ([MovementCoordinator]), and the animation that plays
//! once a move is committed ([MoveAnimation]).

mod animation;
mod coordinator;
mod engine;

pub use self::{
    animation::{AnimationStatus, MoveAnimation},
    coordinator::{
        MoveOutcome, MovementCoordinator, MovementEvent, MovementSession,
        MovementWorld, TargetPreview,
    },
    engine::{
        is_valid_position, MovePath, MovementEngine, Reachable, StepCost,
        TerrainCost, TerrainMap, UniformCost,
    },
};
