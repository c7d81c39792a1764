//! The composite layout lens.
//!
//! [`layout`] assembles a positional sequence from named record fields,
//! some computed through lenses and some injected as constants, by
//! desugaring into `seq(wmap(..), add(..).., order(keys..))`.

use crate::value::Value;

use super::primitive::seq_unchecked;
use super::record::{add, wmap};
use super::{LensRef, order};

enum LayoutAction {
    Lens(LensRef),
    Value(Value),
}

/// One `key -> action` pair of a [`layout`].
pub struct LayoutEntry {
    key: String,
    action: LayoutAction,
}

impl LayoutEntry {
    /// Routes `key`'s value through `lens`.
    pub fn lens(key: impl Into<String>, lens: LensRef) -> Self {
        Self {
            key: key.into(),
            action: LayoutAction::Lens(lens),
        }
    }

    /// Injects `key` into the view with the fixed `value`.
    pub fn value(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            action: LayoutAction::Value(value.into()),
        }
    }
}

/// Assembles a positional sequence from named fields.
///
/// Lens entries are routed into a [`wmap`](super::wmap) keyed by their key;
/// value entries become [`add`](super::add) stages; the keys, in entry
/// order, become the argument list of a trailing [`order`]. `default_to_id`
/// is the `wmap` policy for record keys outside every entry.
///
/// # Example
///
/// ```
/// use bilens::lens::{LayoutEntry, layout, times};
/// use bilens::{record, seq_value};
/// use bilens::value::Value;
///
/// let lens = layout(
///     vec![
///         LayoutEntry::lens("width", times(2.0, Value::Undefined)?),
///         LayoutEntry::value("unit", "px"),
///     ],
///     true,
/// );
/// let shape = record! { "width" => 4.0 };
/// assert_eq!(lens.get(&shape)?, seq_value![8.0, "px"]);
/// assert_eq!(lens.putback(&seq_value![10.0, "px"], &shape)?, record! { "width" => 5.0 });
/// # Ok::<(), bilens::error::LensError>(())
/// ```
pub fn layout(entries: Vec<LayoutEntry>, default_to_id: bool) -> LensRef {
    let mut groups = Vec::new();
    let mut adds = Vec::new();
    let mut keys = Vec::new();
    for entry in entries {
        keys.push(entry.key.clone());
        match entry.action {
            LayoutAction::Lens(lens) => groups.push((vec![entry.key], lens)),
            LayoutAction::Value(value) => adds.push(add(entry.key, value)),
        }
    }
    let mut stages = vec![wmap(groups, default_to_id)];
    stages.extend(adds);
    stages.push(order(keys));
    seq_unchecked(stages)
}
