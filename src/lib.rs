//! # bilens
//!
//! A bidirectional tree-transformation library built from composable lenses.
//!
//! ## Overview
//!
//! A lens relates a *concrete* value to an *abstract* view of it through two
//! operations: `get` extracts the view, and `putback` merges an edited view
//! with the prior concrete value to rebuild it. Small lenses compose into
//! large transformations, and every composite remains editable in both
//! directions. It includes:
//!
//! - **Values**: a dynamic [`Value`](value::Value) tree with an explicit
//!   `Undefined` and loose structural equality
//! - **Primitive Lenses**: identity, constants, invertible functions,
//!   sequential composition
//! - **Record and List Lenses**: hoist/plunge, forks, filters, renames,
//!   ordering, grouping, concatenation
//! - **Conditionals**: dispatch on the concrete or the abstract side
//! - **Stateful Mapping**: per-element lenses over lists with an edit
//!   queue for insertions and deletions
//! - **Contracts**: flat and higher-order contracts with blame
//!
//! ## Feature Flags
//!
//! - `serde`: Serialize/Deserialize implementations for [`value::Value`]
//!
//! ## Example
//!
//! ```rust
//! use bilens::prelude::*;
//!
//! let lens = focus("celsius", Value::Undefined);
//! let reading = record! { "celsius" => 21.0, "sensor" => "attic" };
//!
//! assert_eq!(lens.get(&reading)?, Value::Num(21.0));
//! let edited = lens.putback(&Value::Num(19.5), &reading)?;
//! assert_eq!(edited, record! { "celsius" => 19.5, "sensor" => "attic" });
//! # Ok::<(), bilens::error::LensError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and combinators.
///
/// # Usage
///
/// ```rust
/// use bilens::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Frame, LensError};
    pub use crate::lens::*;
    pub use crate::value::{KeyPred, Value, ValuePred};
    pub use crate::{record, seq_value};
}

pub mod contract;
pub mod error;
pub mod lens;
pub mod value;
