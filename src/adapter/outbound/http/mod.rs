//! HTTP adapter for the tracker service.
//!
//! One client serves both the quest catalog and the progress store.

pub mod client;
pub mod dto;

pub use client::HttpStore;
