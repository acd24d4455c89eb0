//! Persistent record of the documents a reader has already seen.
//!
//! The set only ever grows. Every mutation re-reads the stored slot before
//! writing it back, so the inline graph and the global overlay can both append to
//! it without stepping on each other.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use log::warn;

use crate::error::{GraphError, Result};
use crate::path::DocumentId;

/// Storage slot holding the serialized visited set.
pub const VISITED_KEY: &str = "graph-visited";

/// Minimal string key/value persistence.
pub trait KeyValueStore {
	/// Reads the value stored under `key`, if any.
	fn load(&self, key: &str) -> Option<String>;
	/// Replaces the value stored under `key`.
	fn save(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
	fn load(&self, key: &str) -> Option<String> {
		(**self).load(key)
	}

	fn save(&self, key: &str, value: &str) -> Result<()> {
		(**self).save(key, value)
	}
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
	fn load(&self, key: &str) -> Option<String> {
		(**self).load(key)
	}

	fn save(&self, key: &str, value: &str) -> Result<()> {
		(**self).save(key, value)
	}
}

/// `window.localStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
	fn storage() -> Result<web_sys::Storage> {
		web_sys::window()
			.ok_or_else(|| GraphError::Storage("no window".into()))?
			.local_storage()
			.map_err(GraphError::from_js)?
			.ok_or_else(|| GraphError::Storage("localStorage disabled".into()))
	}
}

impl KeyValueStore for LocalStorage {
	fn load(&self, key: &str) -> Option<String> {
		Self::storage().ok()?.get_item(key).ok().flatten()
	}

	fn save(&self, key: &str, value: &str) -> Result<()> {
		Self::storage()?
			.set_item(key, value)
			.map_err(|e| GraphError::Storage(GraphError::from_js(e).to_string()))
	}
}

/// In-memory store, used when `localStorage` is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
	slots: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
	fn load(&self, key: &str) -> Option<String> {
		self.slots.borrow().get(key).cloned()
	}

	fn save(&self, key: &str, value: &str) -> Result<()> {
		self.slots.borrow_mut().insert(key.to_string(), value.to_string());
		Ok(())
	}
}

/// Append-only set of visited documents backed by a [`KeyValueStore`].
pub struct VisitedSet<S> {
	store: S,
}

impl<S: KeyValueStore> VisitedSet<S> {
	/// Wraps `store`; nothing is read until [`VisitedSet::load`].
	pub fn new(store: S) -> Self {
		Self { store }
	}

	/// Current contents of the set. An unreadable slot counts as empty.
	pub fn load(&self) -> BTreeSet<DocumentId> {
		let Some(raw) = self.store.load(VISITED_KEY) else {
			return BTreeSet::new();
		};
		match serde_json::from_str::<Vec<DocumentId>>(&raw) {
			Ok(ids) => ids.into_iter().collect(),
			Err(e) => {
				warn!("quartz-graph: ignoring unreadable visited set: {}", e);
				BTreeSet::new()
			}
		}
	}

	/// Adds `id` and persists the result. Returns whether `id` was new.
	pub fn mark(&self, id: &DocumentId) -> Result<bool> {
		let mut visited = self.load();
		if !visited.insert(id.clone()) {
			return Ok(false);
		}
		let ids: Vec<&DocumentId> = visited.iter().collect();
		self.store.save(VISITED_KEY, &serde_json::to_string(&ids)?)?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_empty() {
		let visited = VisitedSet::new(MemoryStore::default());
		assert!(visited.load().is_empty());
	}

	#[test]
	fn mark_is_idempotent() {
		let visited = VisitedSet::new(MemoryStore::default());
		assert!(visited.mark(&"a".into()).unwrap());
		assert!(!visited.mark(&"a".into()).unwrap());
		assert_eq!(visited.load().len(), 1);
	}

	#[test]
	fn grows_monotonically() {
		let visited = VisitedSet::new(MemoryStore::default());
		let mut previous = BTreeSet::new();
		for slug in ["a", "b", "a", "c/", "/"] {
			visited.mark(&slug.into()).unwrap();
			let current = visited.load();
			assert!(current.is_superset(&previous));
			previous = current;
		}
		assert_eq!(previous.len(), 4);
	}

	#[test]
	fn persists_as_json_array() {
		let store = MemoryStore::default();
		VisitedSet::new(&store).mark(&"notes/graph".into()).unwrap();
		assert_eq!(store.load(VISITED_KEY).as_deref(), Some(r#"["notes/graph"]"#));
	}

	#[test]
	fn reads_what_another_writer_left() {
		let store = MemoryStore::default();
		store.save(VISITED_KEY, r#"["x","y"]"#).unwrap();
		let visited = VisitedSet::new(&store);
		visited.mark(&"z".into()).unwrap();
		let ids: Vec<_> = visited.load().into_iter().map(|d| d.to_string()).collect();
		assert_eq!(ids, ["x", "y", "z"]);
	}

	#[test]
	fn unreadable_slot_is_treated_as_empty() {
		let store = MemoryStore::default();
		store.save(VISITED_KEY, "{not json").unwrap();
		assert!(VisitedSet::new(&store).load().is_empty());
	}
}
