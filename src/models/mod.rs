//! Data models for the publishing dataset controller.
//!
//! Upstream wire shapes (dataset API, collections, topics) live beside the view models the
//! front end consumes.
//!
//! The upstreams write `null` for unset lists and strings, so every non-`Option` field decodes
//! through [`null_as_default`].

mod collection;
mod dataset;
mod topic;
mod view;

pub use collection::*;
pub use dataset::*;
pub use topic::*;
pub use view::*;

use serde::{Deserialize, Deserializer};

/// Decode a field, treating an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
