//! Small helpers shared across the wire types.

pub mod b64;
