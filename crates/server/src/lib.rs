//! The voice gateway server: session lifecycle, the model stream worker,
//! tool invocation coordination, and the client-facing HTTP/WebSocket
//! surface. Module layout mirrors the teacher's `server` crate.

pub mod auth;
pub mod coordinator;
pub mod history;
pub mod http;
pub mod metrics;
pub mod session;
pub mod state_machine;
pub mod supervisor;
pub mod system_prompt;
pub mod websocket;
pub mod worker;

pub use session::{Session, SessionRegistry};
pub use state_machine::Phase;
pub use supervisor::GatewaySupervisor;
