//! The Event Codec (C3) and the model-facing duplex stream client consumed
//! by the Model Stream Worker (C5).

pub mod client;
pub mod codec;
pub mod error;

pub use client::{ModelStreamClient, ModelStreamConfig, ModelStreamReceiver, ModelStreamSender};
pub use codec::{ContentType, GenerationStage, InboundEvent, OutboundEvent, Role};
pub use error::ModelError;
