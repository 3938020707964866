//! HTTP front end for the RUL decision engine

pub mod api;
pub mod config;
