// Deck Debater - pitch deck review gateway and client
// Library exports

// Gateway side
pub mod backend;
pub mod config;
pub mod server;

// Client side
pub mod personas;
pub mod report;
pub mod review;
pub mod session;
pub mod views;

pub use config::Config;
pub use personas::{Persona, PersonaCatalog, PersonaCategory};
pub use report::ResultsReport;
pub use review::{DeckGateway, GatewayClient, ReviewError, ReviewSession};
pub use server::GatewayServer;
pub use session::{DebateResult, DeckUpload, SessionStore};
