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

//! Correlated calls: slots, the slot allocator, and call handles.
//!
//! A call allocates a [`CallSlot`] from [`CallSlots`], stamps the slot's
//! correlation ID into the request, and waits for the slot to settle. The
//! connector resolves slots as replies arrive and fails them all at once when
//! the connection drops.
//!
//! ```text
//!              ┌── reply ──────► Resolved
//!   Pending ───┼── cancel ─────► Cancelled
//!              ├── disconnect ─► Failed(Disconnected)
//!              └── timeout* ───► Failed(Timeout)     *blocking calls only
//! ```

mod error;
mod handle;
mod slot;
mod slots;

pub use error::CallError;
pub use handle::CallHandle;
pub use slot::{CallSlot, OnTimeout};
pub use slots::{CallSlots, Resolution};
