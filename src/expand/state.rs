//! Performance state threaded through expansion.

use num_rational::Ratio;
use num_traits::One;
use serde::{Deserialize, Serialize};

/// Inherited performance attributes.
///
/// State flows forward through a sequence: a control command changes it for
/// every following sibling and anything nested beneath them. Branches of a
/// choice each receive their own copy, so one alternative can never observe
/// another's changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfState {
    pub instrument: String,
    pub velocity: u32,
}

impl Default for PerfState {
    fn default() -> Self {
        Self {
            instrument: "sine".to_string(),
            velocity: 50,
        }
    }
}

/// Branch-scoped operator context: the accumulated duration scale and
/// transposition at the current point in the tree. Unlike [`PerfState`] it
/// never flows between siblings — each operand gets the enclosing value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Env {
    pub scale: Ratio<i64>,
    pub transpose: i32,
}

impl Default for Env {
    fn default() -> Self {
        Self {
            scale: Ratio::one(),
            transpose: 0,
        }
    }
}
