//! Questline Storylines — concrete storyline handlers.
//!
//! Each handler implements [`Storyline`] for one mission type. New mission
//! types are added here and registered under their mission name; the engine
//! itself never changes.

pub mod materials_for_war_preparation;

use questline_core::storyline::Storyline;

pub use materials_for_war_preparation::MaterialsForWarPreparation;

/// Every built-in handler paired with the mission name it serves.
#[must_use]
pub fn builtin() -> Vec<(&'static str, Box<dyn Storyline>)> {
    vec![(
        MaterialsForWarPreparation::MISSION_NAME,
        Box::new(MaterialsForWarPreparation),
    )]
}
