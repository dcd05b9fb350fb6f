//! Core types and trait definitions for the Kingdom Nurturing Suite.
//!
//! This crate has no HTTP or database dependencies. It holds
//! the domain records, the pure rules that govern them (hierarchy moves, role
//! eligibility, consent and approval transitions), and the
//! [`store::CommunityStore`] abstraction that storage backends implement.

pub mod approval;
pub mod catalog;
pub mod consent;
pub mod counter;
pub mod eligibility;
pub mod encryption;
pub mod error;
pub mod group;
pub mod hierarchy;
pub mod journey;
pub mod location;
pub mod notification;
pub mod profile;
pub mod settings;
pub mod stats;
pub mod store;
pub mod tree;

pub use error::{Error, Result};
