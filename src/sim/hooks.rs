//! Ordered lists of named handlers
//!
//! Gameplay stacks effects ("on detonate", "on hit", "on destroy") as
//! `(key, data, handler)` entries. Keys are stable so a later upgrade can
//! find an existing entry and bump its data instead of adding a second one.

use std::fmt;
use std::rc::Rc;

/// A named handler with a tunable payload
pub struct Hook<F: ?Sized> {
    pub key: String,
    pub data: f32,
    pub func: Rc<F>,
}

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: self.data,
            func: Rc::clone(&self.func),
        }
    }
}

/// Hooks run in insertion order
pub struct HookList<F: ?Sized> {
    hooks: Vec<Hook<F>>,
}

impl<F: ?Sized> Default for HookList<F> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<F: ?Sized> Clone for HookList<F> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for HookList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.hooks.iter().map(|h| (&h.key, h.data)))
            .finish()
    }
}

impl<F: ?Sized> HookList<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, data: f32, func: Rc<F>) {
        self.hooks.push(Hook {
            key: key.into(),
            data,
            func,
        });
    }

    pub fn find(&self, key: &str) -> Option<&Hook<F>> {
        self.hooks.iter().find(|h| h.key == key)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Hook<F>> {
        self.hooks.iter_mut().find(|h| h.key == key)
    }

    pub fn data(&self, key: &str) -> Option<f32> {
        self.find(key).map(|h| h.data)
    }

    /// Update the payload of an existing hook. Returns false if absent.
    pub fn set_data(&mut self, key: &str, data: f32) -> bool {
        match self.find_mut(key) {
            Some(hook) => {
                hook.data = data;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|h| h.key != key);
        self.hooks.len() != before
    }

    /// Copy of this list with one key left out
    pub fn without(&self, key: &str) -> Self {
        Self {
            hooks: self.hooks.iter().filter(|h| h.key != key).cloned().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hook<F>> {
        self.hooks.iter()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
