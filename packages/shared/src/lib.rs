//! Shared library for the irori chat relay.
//!
//! Everything both sides of the wire need: the JSON frame protocol, the
//! validation rules applied to user input, time utilities, and logging setup.

pub mod logger;
pub mod protocol;
pub mod time;
pub mod validate;
