//! Stable JSON for files the client writes.
//!
//! Output uses 2-space indentation, a trailing newline and (with
//! `BTreeMap` sources) sorted keys, so the credentials file reads the same
//! after every save.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
