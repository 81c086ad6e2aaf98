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

//! Message envelopes exchanged with the peer runtime.
//!
//! An [`Envelope`] is the unit of every request, reply and notification. It
//! carries three things:
//!
//! - an optional **class**, the string tag used to route notifications to
//!   callbacks registered for that class;
//! - an optional [`CorrelationId`], present on requests that expect a reply
//!   and on the replies themselves;
//! - a structured JSON **body**.
//!
//! Envelopes are immutable once built. Cloning one is a reference-count bump,
//! so the same envelope can be handed read-only to every callback in a
//! fan-out without copying the body.
//!
//! # Example
//!
//! ```rust
//! use langbridge::envelope::{CorrelationId, Envelope};
//! use serde_json::json;
//!
//! let request = Envelope::new("Evaluate")
//!     .with_body(json!({ "expr": "1 + 1" }))
//!     .with_correlation_id(CorrelationId::from(9));
//!
//! let reply = Envelope::reply_to(&request, json!({ "value": 2 }));
//! assert_eq!(reply.correlation_id(), request.correlation_id());
//! assert_eq!(reply.class(), None);
//! ```

mod correlation;
mod error;

pub use correlation::{CorrelationId, CorrelationIdGenerator};
pub use error::EnvelopeError;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The fields of an envelope, shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EnvelopeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<CorrelationId>,
    #[serde(default)]
    body: Value,
}

/// An immutable, cheaply cloned message.
#[derive(Clone, PartialEq)]
pub struct Envelope(Arc<EnvelopeData>);

impl Envelope {
    /// Creates an empty envelope of the given class.
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self(Arc::new(EnvelopeData {
            class: Some(class.into()),
            correlation_id: None,
            body: Value::Null,
        }))
    }

    /// Creates an envelope that carries no class.
    ///
    /// Such an envelope can only be routed as a reply; if it matches no
    /// outstanding call it is dropped.
    #[must_use]
    pub fn untyped() -> Self {
        Self(Arc::new(EnvelopeData {
            class: None,
            correlation_id: None,
            body: Value::Null,
        }))
    }

    /// Creates a reply to `request`, carrying the request's correlation ID.
    #[must_use]
    pub fn reply_to(request: &Envelope, body: Value) -> Self {
        Self(Arc::new(EnvelopeData {
            class: None,
            correlation_id: request.correlation_id(),
            body,
        }))
    }

    /// Returns a copy of this envelope with the given body.
    #[must_use]
    pub fn with_body(self, body: Value) -> Self {
        self.map(|data| data.body = body)
    }

    /// Returns a copy of this envelope with the given class.
    #[must_use]
    pub fn with_class(self, class: impl Into<String>) -> Self {
        let class = class.into();
        self.map(|data| data.class = Some(class))
    }

    /// Returns a copy of this envelope stamped with `id`.
    #[must_use]
    pub fn with_correlation_id(self, id: CorrelationId) -> Self {
        self.map(|data| data.correlation_id = Some(id))
    }

    /// The class used to route this envelope to callbacks, if any.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.0.class.as_deref()
    }

    /// The correlation ID, if this is a request or a reply.
    #[must_use]
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.0.correlation_id
    }

    /// The structured payload.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.0.body
    }

    /// Returns `true` if both handles refer to the same underlying envelope.
    #[must_use]
    pub fn ptr_eq(&self, other: &Envelope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Encodes the envelope as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Encode`] if the body cannot be serialized.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self.0.as_ref()).map_err(|source| EnvelopeError::Encode { source })
    }

    /// Decodes an envelope from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Decode`] if `bytes` is not a valid envelope.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice::<EnvelopeData>(bytes)
            .map(|data| Self(Arc::new(data)))
            .map_err(|source| EnvelopeError::Decode { source })
    }

    fn map(self, f: impl FnOnce(&mut EnvelopeData)) -> Self {
        let mut data = Arc::unwrap_or_clone(self.0);
        f(&mut data);
        Self(Arc::new(data))
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("class", &self.0.class)
            .field("correlation_id", &self.0.correlation_id)
            .field("body", &self.0.body)
            .finish()
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        EnvelopeData::deserialize(deserializer).map(|data| Self(Arc::new(data)))
    }
}
