// Creature Battle Schema - Shared record definitions
// This crate contains the static record types that are shared between the
// engine crate and its build script, so the RON-authored tables can be
// validated and compiled into postcard blobs at build time.

pub use conditions::*;
pub use hooks::*;
pub use ids::*;
pub use records::*;
pub use types::*;

pub mod conditions;
pub mod hooks;
pub mod ids;
pub mod records;
pub mod types;

/// Decodes a compiled table blob produced by the build script.
pub fn decode_table<T>(bytes: &[u8]) -> Result<Vec<T>, postcard::Error>
where
    T: serde::de::DeserializeOwned,
{
    postcard::from_bytes(bytes)
}
