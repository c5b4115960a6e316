//! REST API for the AQLX clinical query engine.

pub mod rest;

pub use rest::RestApi;
