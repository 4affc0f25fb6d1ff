//! Primitive types shared across spec components
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

pub mod data_type;
pub mod mode;
pub mod resource;
pub mod unit;

pub use data_type::DataType;
pub use mode::{CacheRevalidation, OpenMode, ReadWriteMode};
pub use resource::{CachePool, ConcurrencyLimit, Context, ContextResource, Resource, ResourceKind};
pub use unit::Unit;

/// Largest rank accepted for any domain, layout or transform
pub const MAX_RANK: usize = 32;
