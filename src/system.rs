//! External process plumbing.

pub mod executor;
