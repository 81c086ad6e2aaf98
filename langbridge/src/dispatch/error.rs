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

use thiserror::Error;

/// Errors raised by the [`DispatchExecutor`](super::DispatchExecutor).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The executor has shut down and accepts no more work.
    #[error("dispatch executor '{name}' is shut down")]
    Stopped {
        /// Base name of the executor's worker threads
        name: String,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn dispatch worker '{name}': {source}")]
    SpawnFailed {
        /// Name of the thread that failed to start
        name: String,
        /// The operating system error
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// Returns `true` for [`DispatchError::Stopped`].
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}
