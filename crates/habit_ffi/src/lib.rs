//! FFI surface of the habit tracker.
//! Dart bindings are generated from `api`.

pub mod api;
