//! Inbound component-bag schema
//!
//! This module defines the contract between the engine and the raw signal
//! probes: the well-known component keys, the reserved-key convention for
//! engine-attached metadata, and shape-tolerant readers over the opaque
//! component values the probes deliver.

mod component;
mod keys;

pub use component::*;
pub use keys::*;
