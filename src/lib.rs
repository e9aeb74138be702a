//! Vacation entitlement and approval service.
//!
//! The pure rules (tenure, entitlement, accrual, request workflow) live in
//! [`vacation`]; [`api`] and [`batch`] wire them to MySQL through [`db`].

pub mod api;
pub mod auth;
pub mod batch;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod report;
pub mod routes;
pub mod telemetry;
pub mod utils;
pub mod vacation;
