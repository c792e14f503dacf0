// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Identifier generators.
//!
//! A generator is called with the record kind when a record without an
//! identifier is injected.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::traits::StorageError;

pub type IdGenerator<Id> = Arc<dyn Fn(&str) -> Result<Id, StorageError> + Send + Sync>;

/// Random v4 UUIDs, hyphenated.
#[must_use]
pub fn uuid_generator<Id: From<String> + 'static>() -> IdGenerator<Id> {
    Arc::new(|_kind: &str| Ok(Id::from(uuid::Uuid::new_v4().to_string())))
}

/// Monotonic in-process sequence starting at `start`.
#[must_use]
pub fn sequence_generator<Id: From<u64> + 'static>(start: u64) -> IdGenerator<Id> {
    let next = AtomicU64::new(start);
    Arc::new(move |_kind: &str| Ok(Id::from(next.fetch_add(1, Ordering::Relaxed))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_generator_counts_up() {
        let generate: IdGenerator<u64> = sequence_generator(10);
        assert_eq!(generate("person").unwrap(), 10);
        assert_eq!(generate("person").unwrap(), 11);
        assert_eq!(generate("car").unwrap(), 12);
    }

    #[test]
    fn test_uuid_generator_is_unique() {
        let generate: IdGenerator<String> = uuid_generator();
        let a = generate("person").unwrap();
        let b = generate("person").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
