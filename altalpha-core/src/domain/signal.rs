use serde::{Deserialize, Serialize};

/// Directional trading signal. Also used as the position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Long,
    Short,
    #[default]
    Flat,
}

impl Signal {
    /// Numeric exposure: +1, -1 or 0.
    pub fn exposure(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::Flat => 0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Signal::Flat
    }
}
