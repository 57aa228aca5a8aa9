//! Command-line front end: calculation workflows, reports, and logging setup.

pub mod app;
pub mod logging;
pub mod report;
