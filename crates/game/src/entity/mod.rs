mod combatant;
mod heading;
mod motion;
mod projectile;

pub use combatant::{Combatant, CombatantProfile, PresentationLink};
pub use heading::{normalize_degrees, shortest_delta, turn_toward, velocity};
pub use motion::Body;
pub use projectile::{Projectile, ProjectileId};
