//! Application Services
//!
//! Long-lived orchestration: the command gateway and the synthetic tick
//! driver.

mod gateway;
mod ticker;

pub use gateway::{CommandGateway, CreateOrderError, ResetOutcome};
pub use ticker::{TickerConfig, TickerHandle, TickerService};
