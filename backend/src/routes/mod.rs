//! HTTP route handlers. Every router here is nested under `/api`.

pub mod explain;
pub mod extract;
pub mod health;
pub mod history;
pub mod predict;
