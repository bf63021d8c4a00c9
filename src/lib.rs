//! Leave-balance ledger and payroll-deduction engine for an HRM system.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod repository;
pub mod routes;
pub mod service;
