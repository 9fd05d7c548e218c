//! Index structures.
//!
//! - [`btree`] - In-memory B-tree mapping ordered keys to object ids

pub mod btree;
