//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod prefix;
pub mod retry;
pub mod service;

pub use prefix::PrefixService;
pub use retry::CallPolicy;
pub use service::TagRegistryService;
