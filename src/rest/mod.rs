//! Response wrappers handed back by dispatchers.
//!
//! - [`Resource<T>`]: a shared handle on a parsed payload whose fields can be
//!   reset in place with [`Resource::reset`]
//! - [`Clearable`]: the per-type definition of "reset every field"
//!
//! Dispatchers return `Resource<serde_json::Value>` by default; typed
//! payloads go through [`Dispatcher::send_as`](crate::clients::Dispatcher::send_as)
//! and must implement [`Clearable`] themselves.

mod resource;

pub use resource::{Clearable, Resource};
