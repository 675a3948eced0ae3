//! Agent system: dispatch loop, session memory, and the shared agent.

pub mod agent;
pub mod dispatch;
pub mod session;

pub use agent::{build_registry, dispatch_settings, Agent, Interaction};
pub use dispatch::{DispatchLoop, DispatchOutcome, DispatchSettings, DispatchStatus};
pub use session::{Session, SessionStore};
