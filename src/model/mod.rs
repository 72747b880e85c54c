pub mod catalog;
pub mod category;
pub mod config;
pub mod container;
pub mod food;
pub mod id;
pub mod tag;

pub use catalog::*;
pub use category::*;
pub use config::*;
pub use container::*;
pub use food::*;
pub use id::*;
pub use tag::*;

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
