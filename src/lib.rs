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

//! Archetype Store - archetype-based entity component storage
//!
//! Entities with the same component set share one archetype whose
//! components live in dense per-type columns. Adding or removing a
//! component moves the entity between archetypes; cached queries find
//! the archetypes matching an include/exclude set.

pub mod archetype;
pub mod bitset;
pub mod buffer;
pub mod column;
pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod mask;
pub mod prelude;
pub mod query;
pub mod world;


pub use archetype::*;
pub use bitset::*;
pub use buffer::*;
pub use column::*;
pub use component::*;
pub use config::*;
pub use entity::*;
pub use error::*;
pub use mask::*;
pub use query::*;
pub use world::*;
