//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the crate.
//! In particular, it exposes a [`Slab`] used by selectors to hand out
//! reusable registration tokens.

mod slab;

pub(crate) use slab::Slab;
