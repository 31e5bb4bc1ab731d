//! Client Connection Handler (C7): the client-facing WebSocket at
//! `/novasonic`. Deliberately distinct from the model-facing
//! `OutboundEvent`/`InboundEvent` vocabulary — see the design note on the
//! two codecs never being unified. Grounded on the teacher's
//! `server::websocket::{WsMessage, WebSocketHandler}` split-socket pattern.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use voice_gateway_core::{ContentId, GatewayError, UserIdentity};
use voice_gateway_model::{ContentType, GenerationStage, ModelStreamClient, ModelStreamConfig, Role};

use crate::auth::JwtValidator;
use crate::history::parse_history;
use crate::session::{ClientNotice, Session, SessionObserver};
use crate::state_machine::{Phase, SessionEvent};
use crate::supervisor::GatewaySupervisor;
use crate::system_prompt::{build_system_prompt, tool_configuration};

/// Client-facing frames: browser/app -> gateway. Distinct field names from
/// the model vocabulary are intentional.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    StartSession {
        /// Prior transcript text, parsed by `crate::history::parse_history`.
        #[serde(default)]
        content: Option<String>,
    },
    AudioStart,
    AudioData {
        /// base64-encoded 16 kHz 16-bit little-endian mono PCM.
        audio: String,
    },
    AudioStop,
    EndSession,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeUser {
    pub user_id: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalModelFields {
    pub generation_stage: GenerationStage,
}

/// Client-facing frames: gateway -> browser/app, per the client vocabulary's
/// `welcome, sessionStarted, sessionReady, contentStart, textOutput,
/// audioOutput, contentEnd, streamComplete, error, sessionTimeout`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    Welcome {
        user: WelcomeUser,
    },
    SessionStarted {
        session_id: String,
    },
    SessionReady {
        message: String,
        state: String,
    },
    ContentStart {
        #[serde(rename = "type")]
        content_type: ContentType,
        role: Role,
        content_id: ContentId,
        #[serde(skip_serializing_if = "Option::is_none")]
        completion_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        additional_model_fields: Option<AdditionalModelFields>,
    },
    TextOutput {
        content: String,
        role: Role,
        content_id: ContentId,
        #[serde(skip_serializing_if = "Option::is_none")]
        completion_id: Option<String>,
    },
    AudioOutput {
        content: String,
    },
    ContentEnd {
        #[serde(rename = "type")]
        content_type: ContentType,
        role: Role,
        content_id: ContentId,
        #[serde(skip_serializing_if = "Option::is_none")]
        completion_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
    StreamComplete,
    Error {
        message: String,
    },
    SessionTimeout {
        message: String,
        details: String,
        session_id: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(rename = "idToken")]
    pub id_token: Option<String>,
}

/// Forwards session-level events onto the client socket. Tool-tagged
/// content never reaches this far (the worker already filters it before
/// calling `notify`), but the `role == Tool` check is kept here too — no
/// frame with `role=TOOL` is ever forwarded to the client, full stop.
struct ClientForwarder {
    sender: tokio::sync::mpsc::UnboundedSender<ServerFrame>,
}

impl SessionObserver for ClientForwarder {
    fn on_client_notice(&self, notice: ClientNotice) {
        let frame = match notice {
            ClientNotice::Welcome { user_id, username } => {
                ServerFrame::Welcome { user: WelcomeUser { user_id, username } }
            }
            ClientNotice::SessionStarted { session_id } => ServerFrame::SessionStarted { session_id },
            ClientNotice::SessionReady { message, state } => ServerFrame::SessionReady { message, state },
            ClientNotice::ContentStart { content_type, role, content_id, completion_id, generation_stage } => {
                if role == Role::Tool {
                    return;
                }
                ServerFrame::ContentStart {
                    content_type,
                    role,
                    content_id,
                    completion_id,
                    additional_model_fields: generation_stage.map(|generation_stage| AdditionalModelFields { generation_stage }),
                }
            }
            ClientNotice::TextOutput { role, content, content_id, completion_id } => {
                if role == Role::Tool {
                    return;
                }
                ServerFrame::TextOutput { content, role, content_id, completion_id }
            }
            ClientNotice::AudioOutput { content } => ServerFrame::AudioOutput { content },
            ClientNotice::ContentEnd { content_type, role, content_id, completion_id, stop_reason } => {
                if role == Role::Tool {
                    return;
                }
                ServerFrame::ContentEnd { content_type, role, content_id, completion_id, stop_reason }
            }
            ClientNotice::StreamComplete => ServerFrame::StreamComplete,
            ClientNotice::ToolInvoked { .. } => return,
            ClientNotice::SessionTimeout { message, details, session_id } => {
                ServerFrame::SessionTimeout { message, details, session_id }
            }
            ClientNotice::Error { message } => ServerFrame::Error { message },
        };
        let _ = self.sender.send(frame);
    }
}

pub struct WebSocketHandlerState {
    pub supervisor: Arc<GatewaySupervisor>,
    pub validator: Arc<JwtValidator>,
    pub model_config: ModelStreamConfig,
}

/// Extracts a bearer credential from either `?idToken=` or an
/// `Authorization: Bearer` header, per the client vocabulary's auth step —
/// the query param and the header are equally acceptable.
fn extract_token(query: &ConnectQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = &query.id_token {
        return Some(token.clone());
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

pub async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WebSocketHandlerState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Response {
    let token = extract_token(&query, &headers);
    ws.on_upgrade(move |socket| handle_socket(socket, token, state))
}

/// Rejects an unauthenticated connection the way the client vocabulary
/// requires: a framed `error` first, then a WebSocket close with code 1008
/// (policy violation) — never a bare pre-upgrade HTTP status.
async fn reject_unauthenticated(socket: WebSocket, error: GatewayError) {
    let (mut sender, _) = socket.split();
    if let Ok(text) = serde_json::to_string(&ServerFrame::Error { message: error.to_string() }) {
        let _ = sender.send(Message::Text(text)).await;
    }
    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code: 1008,
            reason: "unauthenticated".into(),
        })))
        .await;
}

async fn handle_socket(
    socket: WebSocket,
    token: Option<String>,
    state: Arc<WebSocketHandlerState>,
) {
    let identity = match authenticate(&state, token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting unauthenticated connection");
            reject_unauthenticated(socket, e).await;
            return;
        }
    };

    let Some(session) = state.supervisor.admit(identity) else {
        let (mut sender, _) = socket.split();
        let _ = sender
            .send(Message::Text(
                serde_json::to_string(&ServerFrame::Error {
                    message: "gateway at capacity".to_string(),
                })
                .unwrap(),
            ))
            .await;
        return;
    };

    let (client_tx, mut client_rx) = tokio::sync::mpsc::unbounded_channel::<ServerFrame>();
    session.set_observer(Arc::new(ClientForwarder { sender: client_tx }));
    session.notify(ClientNotice::Welcome {
        user_id: session.identity.user_id.clone(),
        username: session.identity.display_name.clone(),
    });

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = client_rx.recv().await {
            let text = serde_json::to_string(&frame).unwrap_or_default();
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let model_session = session.clone();
    let model_config = state.model_config.clone();
    let model_registry_for_loop = state.supervisor.tool_registry();
    let model_registry = model_registry_for_loop.clone();
    let shutdown = state.supervisor.shutdown_signal();
    tokio::spawn(async move {
        match ModelStreamClient::connect(&model_config).await {
            Ok(client) => {
                let (sender, receiver) = client.split();
                let worker = crate::worker::ModelStreamWorker::new(model_session, model_registry);
                worker.run(sender, receiver, shutdown).await;
            }
            Err(e) => {
                tracing::error!(session_id = %model_session.id, error = %e, "failed to connect to model stream");
                let _ = model_session.apply(SessionEvent::ModelError);
            }
        }
    });

    while let Some(Ok(message)) = ws_receiver.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame: ClientFrame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(session_id = %session.id, error = %e, "ignored malformed client frame");
                continue;
            }
        };

        if let Err(e) = handle_client_frame(&session, &model_registry_for_loop, frame).await {
            tracing::warn!(session_id = %session.id, error = %e, "client frame rejected");
        }

        if session.phase() == Phase::Terminated {
            break;
        }
    }

    let _ = session.apply(SessionEvent::Close);
    state.supervisor.release(session.id);
    outbound_task.abort();
}

async fn authenticate(
    state: &WebSocketHandlerState,
    token: Option<String>,
) -> Result<UserIdentity, GatewayError> {
    let token = token.ok_or_else(|| GatewayError::Authentication("missing credentials".to_string()))?;
    state.validator.validate(&token).await
}

async fn handle_client_frame(
    session: &Arc<Session>,
    registry: &Arc<voice_gateway_tools::ToolRegistry>,
    frame: ClientFrame,
) -> Result<(), voice_gateway_core::GatewayError> {
    match frame {
        ClientFrame::StartSession { content } => {
            session.apply(SessionEvent::OpenModelStream)?;
            let tools = tool_configuration(registry);
            session.apply(SessionEvent::SetupPromptStart { tools })?;
            let prompt = build_system_prompt(registry, session.identity.greeting_name());
            session.apply(SessionEvent::SetupSystemPrompt { text: prompt })?;
            if let Some(transcript) = content {
                let messages = parse_history(&transcript);
                if !messages.is_empty() {
                    session.inject_history(messages)?;
                }
            }
            session.notify(ClientNotice::SessionStarted { session_id: session.id.to_string() });
            session.notify(ClientNotice::SessionReady {
                message: "session ready".to_string(),
                state: phase_label(session.phase()),
            });
            Ok(())
        }
        ClientFrame::AudioStart => {
            // A client resuming after a completed turn lands in
            // AudioClosed, which cannot start audio directly — a new turn
            // must be driven (fresh promptStart, then the system prompt
            // re-injected) before audio can reopen.
            if session.phase() == Phase::AudioClosed {
                let tools = tool_configuration(registry);
                session.apply(SessionEvent::StartNewTurn { tools })?;
                let prompt = build_system_prompt(registry, session.identity.greeting_name());
                session.apply(SessionEvent::SetupSystemPrompt { text: prompt })?;
            }
            session.apply(SessionEvent::StartAudio).map(|_| ())
        }
        ClientFrame::AudioData { audio } => {
            session.apply(SessionEvent::AudioChunk { content: audio }).map(|_| ())
        }
        ClientFrame::AudioStop => session.apply(SessionEvent::StopAudio).map(|_| ()),
        ClientFrame::EndSession => session.apply(SessionEvent::Close).map(|_| ()),
    }
}

fn phase_label(phase: Phase) -> String {
    serde_json::to_value(phase)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
