//! Session State Machine (C4): phases, transitions, and the outbound
//! events each transition enqueues. Grounded on
//! `voice_agent_core::traits::fsm::ConversationFSM` — transition is
//! expressed as a total function returning either the new phase or an
//! `IllegalTransition`, per the design note on exception-driven control
//! flow on tool and parse errors.

use serde::{Deserialize, Serialize};
use voice_gateway_core::{ContentId, GatewayError, PromptId};
use voice_gateway_model::{ContentType, OutboundEvent, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Created,
    Initialized,
    PromptStarted,
    SystemPromptSet,
    AudioOpen,
    AudioClosed,
    Terminated,
    Errored,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminated | Phase::Errored)
    }
}

/// One history message to inject, in (role, text) form — see
/// `crate::history`.
#[derive(Debug, Clone)]
pub struct HistoryMessage {
    pub role: Role,
    pub text: String,
}

/// Inputs to a transition. `SessionEvent` names mirror the phase table's
/// "Event" column exactly.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    OpenModelStream,
    SetupPromptStart { tools: Vec<serde_json::Value> },
    SetupSystemPrompt { text: String },
    InjectHistory { messages: Vec<HistoryMessage> },
    StartAudio,
    AudioChunk { content: String },
    StopAudio,
    StartNewTurn { tools: Vec<serde_json::Value> },
    Close,
    ModelError,
    IdleTimeout,
}

/// Everything a transition needs to mint fresh ids and know whether this is
/// the session's first turn; owned and mutated by `Session`.
pub struct TransitionState {
    pub prompt_id: PromptId,
    pub audio_content_id: ContentId,
    pub is_first_turn: bool,
}

/// A transition's outcome: the new phase plus the outbound events to
/// enqueue, in order. `settle` flags whether the caller should pause ~100ms
/// after enqueuing — see the Design Notes' open question on phase-
/// transition pacing.
pub struct TransitionEffects {
    pub events: Vec<OutboundEvent>,
    pub settle: bool,
}

impl TransitionEffects {
    fn new(events: Vec<OutboundEvent>, settle: bool) -> Self {
        Self { events, settle }
    }
}

/// The phase table of the Session State Machine. Transitions not listed are
/// `GatewayError::IllegalTransition` — they fail loudly, never a silent
/// no-op.
pub fn transition(
    phase: Phase,
    event: SessionEvent,
    state: &mut TransitionState,
) -> Result<(Phase, TransitionEffects), GatewayError> {
    use Phase::*;

    // Any non-terminal phase accepts Close, ModelError, and IdleTimeout,
    // regardless of the specific phase — checked before the phase-specific
    // match so every state shares this behavior uniformly.
    if !phase.is_terminal() {
        match &event {
            SessionEvent::Close => {
                let mut events = Vec::new();
                if phase == AudioOpen {
                    events.push(OutboundEvent::ContentEnd {
                        prompt_id: state.prompt_id,
                        content_id: state.audio_content_id,
                    });
                }
                events.push(OutboundEvent::PromptEnd { prompt_id: state.prompt_id });
                events.push(OutboundEvent::SessionEnd);
                return Ok((Terminated, TransitionEffects::new(events, false)));
            }
            SessionEvent::ModelError | SessionEvent::IdleTimeout => {
                return Ok((Errored, TransitionEffects::new(Vec::new(), false)));
            }
            _ => {}
        }
    }

    match (phase, event) {
        (Created, SessionEvent::OpenModelStream) => Ok((
            Initialized,
            TransitionEffects::new(vec![OutboundEvent::SessionStart], true),
        )),

        (Initialized, SessionEvent::SetupPromptStart { tools }) => Ok((
            PromptStarted,
            TransitionEffects::new(
                vec![OutboundEvent::PromptStart {
                    prompt_id: state.prompt_id,
                    tools,
                }],
                true,
            ),
        )),

        (PromptStarted, SessionEvent::SetupSystemPrompt { text }) => {
            let content_id = ContentId::new();
            let events = vec![
                OutboundEvent::ContentStart {
                    prompt_id: state.prompt_id,
                    content_id,
                    content_type: ContentType::Text,
                    role: Role::System,
                    tool_use_id: None,
                },
                OutboundEvent::TextInput {
                    prompt_id: state.prompt_id,
                    content_id,
                    content: text,
                },
                OutboundEvent::ContentEnd {
                    prompt_id: state.prompt_id,
                    content_id,
                },
            ];
            Ok((SystemPromptSet, TransitionEffects::new(events, true)))
        }

        (SystemPromptSet, SessionEvent::InjectHistory { messages }) => {
            let mut events = Vec::with_capacity(messages.len() * 3);
            for message in messages {
                let content_id = ContentId::new();
                events.push(OutboundEvent::ContentStart {
                    prompt_id: state.prompt_id,
                    content_id,
                    content_type: ContentType::Text,
                    role: message.role,
                    tool_use_id: None,
                });
                events.push(OutboundEvent::TextInput {
                    prompt_id: state.prompt_id,
                    content_id,
                    content: message.text,
                });
                events.push(OutboundEvent::ContentEnd {
                    prompt_id: state.prompt_id,
                    content_id,
                });
            }
            Ok((SystemPromptSet, TransitionEffects::new(events, !events.is_empty())))
        }

        (SystemPromptSet, SessionEvent::StartAudio) | (AudioClosed, SessionEvent::StartAudio) => {
            state.audio_content_id = ContentId::new();
            let events = vec![OutboundEvent::ContentStart {
                prompt_id: state.prompt_id,
                content_id: state.audio_content_id,
                content_type: ContentType::Audio,
                role: Role::User,
                tool_use_id: None,
            }];
            Ok((AudioOpen, TransitionEffects::new(events, true)))
        }

        (AudioOpen, SessionEvent::AudioChunk { content }) => {
            let events = vec![OutboundEvent::AudioInput {
                prompt_id: state.prompt_id,
                content_id: state.audio_content_id,
                content,
            }];
            Ok((AudioOpen, TransitionEffects::new(events, false)))
        }

        (AudioOpen, SessionEvent::StopAudio) => {
            let events = vec![OutboundEvent::ContentEnd {
                prompt_id: state.prompt_id,
                content_id: state.audio_content_id,
            }];
            Ok((AudioClosed, TransitionEffects::new(events, true)))
        }

        (AudioClosed, SessionEvent::StartNewTurn { tools }) => {
            state.is_first_turn = false;
            let events = vec![OutboundEvent::PromptStart {
                prompt_id: state.prompt_id,
                tools,
            }];
            Ok((PromptStarted, TransitionEffects::new(events, true)))
        }

        (from, event) => Err(GatewayError::IllegalTransition(format!(
            "{from:?} does not accept {event:?}"
        ))),
    }
}

impl std::fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionEvent::OpenModelStream => "OpenModelStream",
            SessionEvent::SetupPromptStart { .. } => "SetupPromptStart",
            SessionEvent::SetupSystemPrompt { .. } => "SetupSystemPrompt",
            SessionEvent::InjectHistory { .. } => "InjectHistory",
            SessionEvent::StartAudio => "StartAudio",
            SessionEvent::AudioChunk { .. } => "AudioChunk",
            SessionEvent::StopAudio => "StopAudio",
            SessionEvent::StartNewTurn { .. } => "StartNewTurn",
            SessionEvent::Close => "Close",
            SessionEvent::ModelError => "ModelError",
            SessionEvent::IdleTimeout => "IdleTimeout",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> TransitionState {
        TransitionState {
            prompt_id: PromptId::new(),
            audio_content_id: ContentId::new(),
            is_first_turn: true,
        }
    }

    #[test]
    fn full_path_reaches_audio_open() {
        let mut state = state();
        let (phase, _) = transition(Phase::Created, SessionEvent::OpenModelStream, &mut state).unwrap();
        assert_eq!(phase, Phase::Initialized);

        let (phase, _) = transition(
            phase,
            SessionEvent::SetupPromptStart { tools: vec![] },
            &mut state,
        )
        .unwrap();
        assert_eq!(phase, Phase::PromptStarted);

        let (phase, _) = transition(
            phase,
            SessionEvent::SetupSystemPrompt { text: "hello".to_string() },
            &mut state,
        )
        .unwrap();
        assert_eq!(phase, Phase::SystemPromptSet);

        let (phase, _) = transition(phase, SessionEvent::StartAudio, &mut state).unwrap();
        assert_eq!(phase, Phase::AudioOpen);
    }

    #[test]
    fn illegal_transition_is_an_error_not_a_no_op() {
        let mut state = state();
        let result = transition(Phase::Created, SessionEvent::StartAudio, &mut state);
        assert!(matches!(result, Err(GatewayError::IllegalTransition(_))));
    }

    #[test]
    fn audio_closed_can_start_a_new_turn() {
        let mut state = state();
        let result = transition(
            Phase::AudioClosed,
            SessionEvent::StartNewTurn { tools: vec![] },
            &mut state,
        );
        assert!(matches!(result, Ok((Phase::PromptStarted, _))));
        assert!(!state.is_first_turn);
    }

    #[test]
    fn close_from_audio_open_emits_content_end_first() {
        let mut state = state();
        let (phase, effects) = transition(Phase::AudioOpen, SessionEvent::Close, &mut state).unwrap();
        assert_eq!(phase, Phase::Terminated);
        assert_eq!(effects.events.len(), 3);
        assert!(matches!(effects.events[0], OutboundEvent::ContentEnd { .. }));
        assert!(matches!(effects.events[1], OutboundEvent::PromptEnd { .. }));
        assert!(matches!(effects.events[2], OutboundEvent::SessionEnd));
    }

    #[test]
    fn model_error_does_not_enqueue_further_events() {
        let mut state = state();
        let (phase, effects) =
            transition(Phase::AudioOpen, SessionEvent::ModelError, &mut state).unwrap();
        assert_eq!(phase, Phase::Errored);
        assert!(effects.events.is_empty());
    }
}
