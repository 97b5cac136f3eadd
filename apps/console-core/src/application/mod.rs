//! Application Layer
//!
//! Orchestrates the domain through the command gateway and the tick
//! driver. It defines:
//!
//! - **Ports**: Interfaces for interacting with external systems
//! - **Services**: The command gateway and the synthetic tick driver

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
