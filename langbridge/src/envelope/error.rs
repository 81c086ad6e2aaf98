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

//! Envelope encoding errors.

use thiserror::Error;

/// Error raised while converting an [`Envelope`](super::Envelope) to or from bytes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The envelope could not be serialized.
    #[error("failed to encode envelope: {source}")]
    Encode {
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The bytes did not contain a valid envelope.
    #[error("failed to decode envelope: {source}")]
    Decode {
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}
