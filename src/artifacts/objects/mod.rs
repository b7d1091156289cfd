//! Object types consumed and produced by the merge engine
//!
//! The engine reads and writes two kinds of objects, both addressed by
//! SHA-1 hashes:
//!
//! - **Blob**: raw file content
//! - **Tree**: one directory level (names, modes, and object IDs)
//!
//! Both implement serialization/deserialization for the object format:
//! `<type> <size>\0<content>`

pub mod blob;
pub mod entry_mode;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
