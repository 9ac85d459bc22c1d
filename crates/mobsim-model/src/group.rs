//! Unit groups.

use mobsim_common::UnitKey;
use serde::Serialize;
use std::collections::HashSet;

/// An immutable, de-duplicated, ordered set of unit keys.
///
/// Members keep the order in which they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Group {
    members: Vec<UnitKey>,
}

impl Group {
    pub(crate) fn from_keys<'a>(keys: impl IntoIterator<Item = &'a UnitKey>) -> Self {
        let mut seen = HashSet::new();
        let members = keys.into_iter().filter(|k| seen.insert(*k)).cloned().collect();
        Self { members }
    }

    /// Member keys in order.
    pub fn keys(&self) -> &[UnitKey] {
        &self.members
    }

    /// Iterates over member keys.
    pub fn iter(&self) -> impl Iterator<Item = &UnitKey> {
        self.members.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if `key` is a member.
    pub fn contains(&self, key: &str) -> bool {
        self.members.iter().any(|k| k.as_str() == key)
    }
}

impl<'a> IntoIterator for &'a Group {
    type Item = &'a UnitKey;
    type IntoIter = std::slice::Iter<'a, UnitKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
