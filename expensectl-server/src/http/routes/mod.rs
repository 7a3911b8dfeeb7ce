//! Route handlers organized by resource

pub mod health;
pub mod auth;
pub mod expenses;
pub mod csv;
pub mod reports;
pub mod boards;
pub mod columns;
pub mod cards;
