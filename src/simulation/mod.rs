pub mod boundary;
pub mod clock;
pub mod flocking;
pub mod force_field;
pub mod grab;
pub mod impulse;
pub mod integration;
pub mod lifecycle;
pub mod tick;

pub use boundary::{Boundary, BoundaryResponse, BoundaryShape};
pub use clock::{ClockState, SimulationClock, SpeedPreset};
pub use force_field::CollisionMode;
pub use grab::GrabState;
pub use impulse::{ImpulseBus, ImpulseReport};
pub use tick::{run_simulation_tick, TickEvent, TickReport};
