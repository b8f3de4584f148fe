//! # Nav Tools
//!
//! Development tools for the planner: scenario-file validation and
//! offline planning without the server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod scenario;
