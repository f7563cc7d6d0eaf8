//! Core data types

mod entity;

pub use entity::Entity;
