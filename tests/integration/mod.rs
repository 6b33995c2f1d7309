//! Integration tests for session tracking, collector sync and history persistence

mod collector_sync;
mod history_persistence;
mod runtime_collector;
mod session_flow;
