//! Shared, resettable wrapper around a parsed API resource.
//!
//! A [`Resource<T>`] is a handle: cloning it yields another handle on the
//! same value. [`Resource::reset`] blanks the value in place, so every holder
//! observes the invalidation, which replacing the handle would not achieve.
//!
//! What "blank" means is decided per type through the [`Clearable`] trait.
//!
//! # Example
//!
//! ```rust
//! use exoscale::rest::{Clearable, Resource};
//!
//! #[derive(Clone, Debug, Default)]
//! struct Instance {
//!     id: Option<String>,
//!     name: Option<String>,
//! }
//!
//! impl Clearable for Instance {
//!     fn clear(&mut self) {
//!         self.id = None;
//!         self.name = None;
//!     }
//! }
//!
//! let cached = Resource::new(Instance {
//!     id: Some("42".to_string()),
//!     name: Some("web".to_string()),
//! });
//! let held_elsewhere = cached.clone();
//!
//! cached.reset();
//! assert!(held_elsewhere.read(|instance| instance.id.is_none()));
//! assert!(held_elsewhere.ptr_eq(&cached));
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

/// A value whose fields can be reset to their null-equivalent in place.
pub trait Clearable {
    /// Sets every field to its null/empty-equivalent value.
    fn clear(&mut self);
}

impl Clearable for Value {
    /// Object members become `null` (keys are kept), arrays are emptied and
    /// scalars become `null`.
    fn clear(&mut self) {
        match self {
            Self::Object(map) => map.values_mut().for_each(|value| *value = Self::Null),
            Self::Array(items) => items.clear(),
            _ => *self = Self::Null,
        }
    }
}

impl<T> Clearable for Option<T> {
    fn clear(&mut self) {
        *self = None;
    }
}

impl<T> Clearable for Vec<T> {
    fn clear(&mut self) {
        Vec::clear(self);
    }
}

impl Clearable for String {
    fn clear(&mut self) {
        String::clear(self);
    }
}

/// Shared handle on a parsed API resource.
pub struct Resource<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|value| f.debug_tuple("Resource").field(value).finish())
    }
}

impl<T> Resource<T> {
    /// Wraps `value` in a new handle.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Runs `f` with shared access to the value.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Runs `f` with exclusive access to the value.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Replaces the value seen by every handle, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        self.update(|current| std::mem::replace(current, value))
    }

    /// Returns `true` if both handles point to the same value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> Resource<T> {
    /// Returns a copy of the current value.
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.read(T::clone)
    }
}

impl<T: Clearable> Resource<T> {
    /// Blanks every field of the value in place.
    pub fn reset(&self) {
        self.update(Clearable::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reset_is_visible_through_earlier_clone() {
        let resource = Resource::new(json!({"id": "abc", "name": "web", "size": 10}));
        let earlier = resource.clone();

        resource.reset();

        assert!(earlier.ptr_eq(&resource));
        assert_eq!(
            earlier.snapshot(),
            json!({"id": null, "name": null, "size": null})
        );
    }

    #[test]
    fn test_value_clear_on_array_and_scalar() {
        let mut list = json!([1, 2, 3]);
        list.clear();
        assert_eq!(list, json!([]));

        let mut scalar = json!("text");
        scalar.clear();
        assert_eq!(scalar, Value::Null);
    }

    #[test]
    fn test_replace_swaps_value_for_all_handles() {
        let resource = Resource::new(String::from("old"));
        let other = resource.clone();

        let previous = resource.replace(String::from("new"));

        assert_eq!(previous, "old");
        assert_eq!(other.snapshot(), "new");
    }

    #[test]
    fn test_update_mutates_in_place() {
        let resource = Resource::new(vec![1, 2]);
        resource.update(|items| items.push(3));
        assert_eq!(resource.snapshot(), vec![1, 2, 3]);

        resource.reset();
        assert!(resource.read(Vec::is_empty));
    }

    #[test]
    fn test_independent_resources_are_not_ptr_eq() {
        let a = Resource::new(Some(1));
        let b = Resource::new(Some(1));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_debug_shows_inner_value() {
        let resource = Resource::new(Some("x"));
        assert_eq!(format!("{resource:?}"), r#"Resource(Some("x"))"#);
    }
}
