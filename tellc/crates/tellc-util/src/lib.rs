//! tellc-util - Shared infrastructure for the Tell compiler.
//!
//! Provides source location tracking ([`Span`]), diagnostic collection
//! ([`Handler`], [`Diagnostic`]), and the hash map aliases used by the
//! later pipeline stages.

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use span::Span;

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

/// Insertion-ordered map with the fast rustc hasher.
///
/// Deterministic iteration order matters wherever the compiler's output is
/// derived from map contents (scope dumps, the emitted data section).
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Insertion-ordered set with the fast rustc hasher.
pub type FxIndexSet<T> = indexmap::IndexSet<T, BuildHasherDefault<FxHasher>>;
