pub mod model;
pub mod validation;

pub use model::{Address, Incident, IncidentId, IncidentStatus, IncidentSummary, NewIncident};
pub use validation::validate_new_incident;
