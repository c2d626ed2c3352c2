//! Property-based tests.

mod cache_properties;
mod vector_properties;
