pub mod domain;
pub mod flow;
pub mod gate;
pub mod links;
pub mod ports;
pub mod trends;

#[cfg(test)]
mod test_support;

pub use domain::{
    normalize_keyword, HostIdentity, Keyword, Platform, RegistrationProfile, ResultLink,
    SearchEvent, SessionState, TrendEntry, UserRecord, ValidationError,
};
pub use flow::{FlowSettings, RegistrationError, SearchFlow, SearchOutcome};
pub use gate::{GateController, GateDecision, FREE_SEARCH_LIMIT};
pub use ports::{EventStore, PortError, PortResult, UserDirectory};
pub use trends::TrendAggregator;
