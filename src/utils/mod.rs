//! # Utility Modules
//!
//! Supporting utilities shared across the transport implementations.
//!
//! ## Components
//! - **Timeout**: deadline constants and the async deadline wrapper

pub mod timeout;
