//! Session/adapter interface, stats accumulation, and the client-side
//! loop detector.

pub mod active_tools;
pub mod agent;
pub mod error;
pub mod loop_detector;
pub mod mock;
pub mod rate_limit;
pub mod stats;

pub use active_tools::ActiveToolTable;
pub use agent::{
    resolve_tool_name, Agent, AgentEvent, EventHandler, QuotaSnapshot, Response, Session,
    SessionConfig, SessionSummary,
};
pub use error::SessionError;
pub use loop_detector::{LoopDetected, LoopDetector, LoopReason};
pub use mock::{MockAgent, ScriptedTurn};
pub use rate_limit::{detect_rate_limit, RateLimitDetected};
pub use stats::SessionStats;
