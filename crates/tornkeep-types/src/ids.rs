//! Type-safe identifier wrappers around the game's numeric IDs.
//!
//! Players, factions, wars and territories are all identified by stable
//! integers assigned by the external game API. Wrapping each in its own
//! newtype prevents a faction ID from being passed where a player ID is
//! expected. [`RecordId`] is the store-assigned identifier of a single
//! history row.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw numeric identifier.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the inner `i64` value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// External identifier of a player.
    PlayerId
}

define_id! {
    /// External identifier of a faction.
    FactionId
}

define_id! {
    /// External identifier of a war (territory or ranked).
    WarId
}

define_id! {
    /// External identifier of a territory block.
    TerritoryId
}

define_id! {
    /// Store-assigned identifier of one appended history row.
    RecordId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display_is_the_raw_number() {
        assert_eq!(PlayerId::new(12345).to_string(), "12345");
    }

    #[test]
    fn id_serializes_transparently() {
        let json = serde_json::to_string(&FactionId::new(9)).unwrap_or_default();
        assert_eq!(json, "9");
        let back: FactionId = serde_json::from_str("9").unwrap_or(FactionId::new(0));
        assert_eq!(back, FactionId::new(9));
    }
}
