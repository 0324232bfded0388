use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-backed identifier for one of the static tables.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

record_id!(
    /// Key into the species table (e.g. `"emberfox"`).
    SpeciesId
);
record_id!(
    /// Key into the move table (e.g. `"tackle"`).
    MoveId
);
record_id!(
    /// Key into the item table (e.g. `"custap_berry"`).
    ItemId
);
record_id!(
    /// Key into the ability table (e.g. `"blaze"`).
    AbilityId
);
