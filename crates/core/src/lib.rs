//! Shared types for the voice gateway: identity, opaque ids, the gateway-wide
//! error taxonomy, and audio format constants.

pub mod audio;
pub mod error;
pub mod identity;
pub mod ids;

pub use error::GatewayError;
pub use identity::UserIdentity;
pub use ids::{ContentId, PromptId, SessionId, ToolUseId};
