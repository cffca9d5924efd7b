// Copyright 2024 Saptak Santra
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

//! Error types

use std::fmt;

/// Storage error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Entity handle is stale or its index was never allocated
    EntityNotFound,

    /// World configuration could not be parsed
    InvalidConfig(String),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::EntityNotFound => write!(f, "Entity not found"),
            EcsError::InvalidConfig(msg) => write!(f, "Invalid world config: {msg}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<serde_json::Error> for EcsError {
    fn from(err: serde_json::Error) -> Self {
        EcsError::InvalidConfig(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(EcsError::EntityNotFound.to_string(), "Entity not found");
        assert_eq!(
            EcsError::InvalidConfig("bad".into()).to_string(),
            "Invalid world config: bad"
        );
    }
}
