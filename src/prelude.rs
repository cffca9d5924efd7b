//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use archetype_store::prelude::*;
//! ```

pub use crate::archetype::{Archetype, ArchetypeId};
pub use crate::component::{component_id, Bundle, Component, ComponentId, ComponentSet};
pub use crate::config::WorldConfig;
pub use crate::entity::{Entity, EntityLocation};
pub use crate::error::{EcsError, Result};
pub use crate::mask::ComponentMask;
pub use crate::query::Entities;
pub use crate::world::World;
