//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Correlation identifiers linking a request envelope to its reply.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one outstanding request and the reply that answers it.
///
/// ID 0 is reserved and never issued by a [`CorrelationIdGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Creates a correlation ID from a raw value, e.g. one read off the wire.
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Call({})", self.0)
    }
}

/// Generates unique correlation IDs for request-response matching.
///
/// IDs start at 1 and increment monotonically, so the generator can also tell
/// whether an arbitrary ID was ever handed out. The call slot allocator uses
/// that to distinguish a late reply (issued, no longer pending) from an
/// envelope that was never a reply to this connector at all.
///
/// # Thread Safety
///
/// Lock-free; safe to share between threads.
///
/// # Example
///
/// ```rust
/// use langbridge::envelope::CorrelationIdGenerator;
///
/// let generator = CorrelationIdGenerator::new();
/// let id1 = generator.next();
/// let id2 = generator.next();
/// assert_ne!(id1, id2);
/// assert!(generator.was_issued(id1));
/// ```
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next_id: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a new generator starting at ID 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Issues the next correlation ID.
    #[must_use]
    pub fn next(&self) -> CorrelationId {
        CorrelationId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns `true` if `id` has been issued by this generator.
    #[must_use]
    pub fn was_issued(&self, id: CorrelationId) -> bool {
        id.0 != 0 && id.0 < self.next_id.load(Ordering::Acquire)
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_generator_starts_at_one() {
        let generator = CorrelationIdGenerator::new();
        assert_eq!(generator.next(), CorrelationId::from(1));
    }

    #[test]
    fn test_generator_increments() {
        let generator = CorrelationIdGenerator::new();
        assert_eq!(generator.next().as_u64(), 1);
        assert_eq!(generator.next().as_u64(), 2);
        assert!(!generator.was_issued(CorrelationId::from(3)));
    }

    #[test]
    fn test_was_issued() {
        let generator = CorrelationIdGenerator::new();
        let id = generator.next();
        assert!(generator.was_issued(id));
        assert!(!generator.was_issued(CorrelationId::from(0)));
        assert!(!generator.was_issued(CorrelationId::from(id.as_u64() + 1)));
        assert!(!generator.was_issued(CorrelationId::from(u64::MAX)));
    }

    #[test]
    fn test_generator_concurrent() {
        let generator = Arc::new(CorrelationIdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                thread::spawn(move || (0..100).map(|_| generator.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all_ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all_ids.insert(id), "Duplicate ID in concurrent test: {}", id);
            }
        }
        assert_eq!(all_ids.len(), 800);
    }

    #[test]
    fn test_display() {
        assert_eq!(CorrelationId::from(7).to_string(), "Call(7)");
    }
}
