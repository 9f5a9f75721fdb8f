pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod hooks;
pub mod model;
pub mod parsers;
pub mod report;
pub mod sanitize;
pub mod session;
pub mod tracer;
pub mod writer;
