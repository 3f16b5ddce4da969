//! # Modelo de Memoria
//! src/memory/mod.rs
//!
//! Toda la memoria de trabajo del servidor sale de una arena principal
//! reservada al arrancar:
//!
//! ```text
//! ┌──────────────────┬────────────┬────────────┬─────┬────────────┐
//! │ status lines     │ slot 0     │ slot 1     │ ... │ slot N-1   │
//! │ (permanente)     │ sub-arena  │ sub-arena  │     │ sub-arena  │
//! └──────────────────┴────────────┴────────────┴─────┴────────────┘
//! ```
//!
//! Cada petición reclama un slot, trabaja dentro de su sub-arena y al
//! terminar el scope del slot se cierra, dejando la sub-arena como estaba.

pub mod arena;
pub mod fs;
pub mod task;

pub use arena::{Arena, Region, Scope};
pub use fs::FileRead;
pub use task::{SlotLease, TaskPool, MIN_SLOT_BYTES};
