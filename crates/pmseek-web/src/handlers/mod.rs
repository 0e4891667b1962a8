//! HTTP handlers for all web routes.

pub mod citation;
pub mod meta;
pub mod openapi;
pub mod search;
