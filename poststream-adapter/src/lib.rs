//! Adapter utilities for the `poststream` crate.
//!
//! The `poststream` crate is UI-agnostic and holds the model and the geometry math. This crate
//! provides the frame-driven pieces an adapter needs on top of it:
//!
//! - [`ScrollMonitor`]: throttled scroll handling, edge-triggered pagination, the debounced
//!   visible-range report, and anchoring across backward loads
//! - [`ScrollCoordinator`]: jump-to-post that waits for loading and layout before settling,
//!   followed by a flash highlight
//! - [`Tween`]: adapter-driven scroll animation
//!
//! Nothing here owns timers or threads. The adapter passes `now_ms` on every tick.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod coordinator;
mod host;
mod monitor;
mod tween;


pub use anchor::ScrollAnchor;
pub use coordinator::{CoordinatorOptions, Flash, Phase, ScrollCoordinator};
pub use host::StreamHost;
pub use monitor::{MonitorOptions, MonitorTick, ScrollMonitor};
pub use tween::{Easing, Tween};
