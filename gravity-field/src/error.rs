// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Error types for the gravity field engine
//!
//! Only construction-time misconfiguration and persistence failures are
//! errors. Degenerate queries (zero distance, points outside every baked
//! grid) resolve to the zero vector instead.

use crate::attractor::AttractorId;
use thiserror::Error;

/// Errors produced by the gravity field engine
#[derive(Debug, Error)]
pub enum GravityError {
    /// A bake, configuration, or timestep parameter was rejected
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A persisted grid was written by an incompatible format version
    #[error("grid format version {found} is incompatible with {expected}")]
    IncompatibleFormat {
        /// Version recorded in the persisted grid
        found: String,
        /// Version this build reads and writes
        expected: String,
    },

    /// The attractor id is stale or was never allocated by this world
    #[error("unknown attractor {0}")]
    UnknownAttractor(AttractorId),

    /// JSON encoding or decoding failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GravityError>;
