//! Keyed list operations on an ordered secret collection
//!
//! The collection is a plain `Vec` so backend order is kept. All operations
//! preserve the order of untouched entries and keep `(namespace, name)`
//! unique as long as the input was.

use crate::types::{Secret, SecretKey};

/// Index of the secret with this key
pub fn find_index(list: &[Secret], key: &SecretKey) -> Option<usize> {
    list.iter().position(|s| s.matches(&key.namespace, &key.name))
}

/// Merge `secret` onto the entry with the same key, or append it
///
/// Returns the index of the affected entry.
pub fn upsert(list: &mut Vec<Secret>, secret: Secret) -> usize {
    match find_index(list, &secret.key()) {
        Some(index) => {
            list[index].merge(secret);
            index
        }
        None => {
            list.push(secret);
            list.len() - 1
        }
    }
}

/// Remove the entry with this key; absent keys are a no-op
pub fn remove(list: &mut Vec<Secret>, key: &SecretKey) -> Option<Secret> {
    find_index(list, key).map(|index| list.remove(index))
}
