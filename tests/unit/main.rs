//! Unit-level integration suite entry point.

mod cache_tests;
mod config_tests;
mod orchestrator_tests;
mod provider_tests;
