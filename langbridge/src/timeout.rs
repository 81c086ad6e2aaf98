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

//! Relative wait bounds shared by every blocking operation.
//!
//! All blocking entry points ([`Connector::wait_for_startup`], the blocking
//! [`Connector::call`] and [`CallHandle::wait_for_result`]) take a [`Timeout`].
//! A timeout is always relative to the moment the wait begins; the
//! [`Timeout::Infinite`] value disables the bound entirely.
//!
//! [`Connector::wait_for_startup`]: crate::Connector::wait_for_startup
//! [`Connector::call`]: crate::Connector::call
//! [`CallHandle::wait_for_result`]: crate::call::CallHandle::wait_for_result

use std::fmt;
use std::time::{Duration, Instant};

/// A relative bound on how long a blocking operation may wait.
///
/// # Examples
///
/// ```rust
/// use langbridge::Timeout;
/// use std::time::Duration;
///
/// let bounded = Timeout::from(Duration::from_millis(500));
/// assert_eq!(bounded.duration(), Some(Duration::from_millis(500)));
///
/// assert!(Timeout::Infinite.is_infinite());
/// assert_eq!(Timeout::Infinite.duration(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeout {
    /// Wait at most this long.
    After(Duration),
    /// Wait until the condition is met, however long that takes.
    #[default]
    Infinite,
}

impl Timeout {
    /// A zero timeout: observe the current state without blocking.
    pub const IMMEDIATE: Self = Self::After(Duration::ZERO);

    /// Creates a bounded timeout from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self::After(Duration::from_millis(millis))
    }

    /// Returns `true` if this timeout never elapses.
    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Returns the bound, or `None` for [`Timeout::Infinite`].
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        match self {
            Self::After(duration) => Some(*duration),
            Self::Infinite => None,
        }
    }

    /// Converts this relative timeout into an absolute deadline starting now.
    ///
    /// Returns `None` when the timeout is infinite, or when the deadline would
    /// overflow `Instant` (which is treated the same way).
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.duration()
            .and_then(|duration| Instant::now().checked_add(duration))
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self::After(duration)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Self::Infinite, Self::After)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::After(duration) => write!(f, "{:?}", duration),
            Self::Infinite => write!(f, "infinite"),
        }
    }
}
