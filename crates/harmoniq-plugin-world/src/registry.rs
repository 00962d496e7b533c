//! Sorted, key-unique collections built from query result streams.
//!
//! Query engines usually hand back rows grouped by subject and in subject
//! order, so [`Registry::fold`] checks the cheap cases first: a repeat of the
//! last key, an append past the end, a prepend before the start. Anything
//! else means the stream was not ordered; the row is looked up, and if it is
//! new it is pushed and the whole registry is re-sorted.

use std::cmp::Ordering;
use std::collections::VecDeque;

use harmoniq_rdf::Value;

use crate::plugin::{Plugin, PluginClass};

/// Items stored in a [`Registry`], ordered by the canonical string form of
/// their key.
pub trait Keyed {
    fn key(&self) -> &Value;
}

/// What [`Registry::fold`] did with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// The key was already present; the existing item was returned.
    Coalesced,
    Appended,
    Prepended,
    /// The key fell inside the current range and was new, forcing a re-sort.
    Resorted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry<T> {
    items: VecDeque<T>,
}

pub type Plugins = Registry<Plugin>;
pub type PluginClasses = Registry<PluginClass>;

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T: Keyed> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn get_by_uri(&self, uri: &str) -> Option<&T> {
        self.position(uri).ok().and_then(|index| self.items.get(index))
    }

    /// Find or insert the item for `key`, returning it for the caller to
    /// merge row attributes into. `create` is only called for new keys and
    /// must build an item whose key is `key`.
    pub fn fold<F>(&mut self, key: &str, create: F) -> (FoldOutcome, &mut T)
    where
        F: FnOnce() -> T,
    {
        let len = self.items.len();
        let (outcome, index) = match self.items.back().map(|last| key_of(last).cmp(key)) {
            None => {
                self.items.push_back(create());
                (FoldOutcome::Appended, 0)
            }
            Some(Ordering::Equal) => (FoldOutcome::Coalesced, len - 1),
            Some(Ordering::Less) => {
                self.items.push_back(create());
                (FoldOutcome::Appended, len)
            }
            Some(Ordering::Greater) if self.items.front().is_some_and(|first| key_of(first) > key) => {
                self.items.push_front(create());
                (FoldOutcome::Prepended, 0)
            }
            Some(Ordering::Greater) => match self.position(key) {
                Ok(index) => (FoldOutcome::Coalesced, index),
                Err(_) => {
                    self.items.push_back(create());
                    self.resort();
                    let (Ok(index) | Err(index)) = self.position(key);
                    (FoldOutcome::Resorted, index)
                }
            },
        };
        debug_assert_eq!(key_of(&self.items[index]), key);
        (outcome, &mut self.items[index])
    }

    /// A new registry holding the items accepted by `include`. The source is
    /// left untouched.
    pub fn filter<P>(&self, mut include: P) -> Self
    where
        T: Clone,
        P: FnMut(&T) -> bool,
    {
        Self {
            items: self.items.iter().filter(|item| include(item)).cloned().collect(),
        }
    }

    fn position(&self, key: &str) -> Result<usize, usize> {
        self.items.binary_search_by(|item| key_of(item).cmp(key))
    }

    fn resort(&mut self) {
        self.items
            .make_contiguous()
            .sort_by(|a, b| key_of(a).cmp(key_of(b)));
    }
}

fn key_of<T: Keyed>(item: &T) -> &str {
    item.key().as_str()
}

impl<'a, T: Keyed> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Registry<PluginClass> {
    /// Direct subclasses of `parent`.
    pub fn children(&self, parent: &str) -> Vec<&PluginClass> {
        self.items
            .iter()
            .filter(|class| class.parent_uri().is_some_and(|uri| uri.as_str() == parent))
            .collect()
    }
}
