//! # dataroom-entity
//!
//! Domain entity models for DataRoom. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`.

pub mod blob;
pub mod node;
pub mod room;
