//! The `phasetrace_core` crate turns per-frame `(state, dt)` updates of
//! low-dimensional ODE systems into incrementally-growing, resource-bounded
//! trace curves.
//!
//! Key components:
//! - **Traits**: `VectorField` (the system), `TraceSink` (the rendering engine).
//! - **Solvers**: forward Euler plus the distance-triggered step refiner.
//! - **Trace**: the bounded, self-evicting segment buffer with fade-out.
//! - **Trajectory**: live, snapshot and bilateral drivers over one field.
//! - **Family**: multi-start trajectory groups and phase-plane seeding.

pub mod error;
pub mod family;
pub mod solvers;
pub mod style;
pub mod trace;
pub mod trajectory;
pub mod traits;
pub mod velocity;

#[cfg(test)]
pub(crate) mod test_utils;
