//! Wall proximity and enemy detection.

mod collision;
mod enemy;

pub use collision::{CollisionGuard, CollisionStatus, FRONT_RAYS, REAR_RAYS};
pub use enemy::{Detection, EnemyDetector, FusionConfig};
