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

//! Single-worker dispatch of connector work off the transport thread.
//!
//! Callback fan-out and lifecycle reactions run on the [`DispatchExecutor`]'s
//! worker, one task at a time in submission order. The worker can be recycled:
//! it finishes its queue, runs a teardown on itself, and hands the queue to a
//! freshly spawned successor.

mod error;
mod executor;

pub use error::DispatchError;
pub use executor::{DispatchExecutor, Task};
