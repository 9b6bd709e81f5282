// Persona module
// Reviewer identities used to parameterize analysis requests

mod catalog;

pub use catalog::{Persona, PersonaCatalog, PersonaCategory};
