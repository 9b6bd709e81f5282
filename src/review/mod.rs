// Review module
// Client side of the gateway: the HTTP client and the session driver

mod client;
mod error;
mod session;

pub use client::{DeckGateway, GatewayClient};
pub use error::ReviewError;
pub use session::{ReviewSession, SlideAnalysis, DEFAULT_CONCURRENCY};
