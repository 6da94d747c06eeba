#![forbid(unsafe_code)]

//! Core domain model and business logic for the workout composer.
//!
//! This crate provides:
//! - Domain types (exercises, variations, equipment, user state, records)
//! - Catalog management
//! - Candidate filtering, progression resolution and coverage selection
//! - Periodization (rotation, deload, weekly volume)
//! - Section composition and workout planning
//! - Persistence (WAL, CSV, state)

pub mod types;
pub mod flags;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod filter;
pub mod progression;
pub mod selector;
pub mod periodization;
pub mod compose;
pub mod workout;
pub mod wal;
pub mod csv_rollup;
pub mod state;
pub mod history;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use flags::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use compose::{compose_section, SectionConfig, SelectedExercise};
pub use workout::{plan_workout, ComposedSection, ComposedWorkout, Section};
pub use wal::{JsonlSink, WorkoutSink};
pub use history::{FileHistory, WorkoutHistory};
pub use state::{JsonStateStore, MemoryStateStore, RefreshPolicy, SeenSelection, UserStateStore};
pub use periodization::{DeloadStatus, RotationBucket, WeeklyVolume};
