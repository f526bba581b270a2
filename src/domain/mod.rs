pub mod ai;
pub mod animation;
pub mod character;
pub mod enemy;
pub mod entity;
pub mod physics;
pub mod projectile;
pub mod rules;
pub mod sprite;
