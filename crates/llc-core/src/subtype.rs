//! Compensation-charge subtypes.

use serde::{Deserialize, Serialize};

/// A specialised record shape a local land charge is forced into when it
/// references one of the compensation-act provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtypeTag {
    /// Land Compensation Act 1973, section 8(4).
    S8,
    /// Land Compensation Act 1973, section 52(8).
    S52,
}

impl SubtypeTag {
    /// All subtypes, in classification order.
    pub const ALL: [SubtypeTag; 2] = [SubtypeTag::S8, SubtypeTag::S52];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S8 => "s8",
            Self::S52 => "s52",
        }
    }
}

impl std::fmt::Display for SubtypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
