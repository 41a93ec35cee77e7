//! Realtime chat endpoint.
//!
//! One actor per connection, addressed by the (sender, receiver) pair in
//! the path. The handshake resolves the caller's token before the upgrade
//! and registers the connection under the sender's identity; frames then
//! flow registry -> forwarder task -> actor -> socket. Text frames (and any
//! frame whose tag is not `media` or `leave`) are fanned out to the pair
//! before persistence completes, so live order and persisted order may
//! diverge under load. Media frames persist first and
//! are broadcast with the payload rewritten to a storage path. Decode or
//! store faults broadcast an offline presence event and close only this
//! connection; a transport-reported stale state gets one re-registration
//! attempt before the same treatment.

use actix::{
    Actor, ActorContext, Addr, AsyncContext, Handler, Message as ActixMessage, StreamHandler,
};
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{MessageKind, Profile};
use crate::services::conversation_service::SendMessage;
use crate::services::ConversationService;
use crate::state::AppState;
use crate::websocket::events::{ChatFrame, ServerEvent};
use crate::websocket::SubscriberId;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Outbound(String);

#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Registered(SubscriberId);

#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Shutdown;

struct ChatSession {
    sender: Profile,
    receiver_id: Uuid,
    subscriber_id: SubscriberId,
    state: AppState,
    /// Remaining re-registration attempts after a stale transport report.
    stale_retries: u8,
}

/// Pump frames from the registry channel into the session actor until
/// either side goes away.
async fn forward(mut rx: UnboundedReceiver<String>, addr: Addr<ChatSession>) {
    while let Some(frame) = rx.recv().await {
        if !addr.connected() {
            break;
        }
        addr.do_send(Outbound(frame));
    }
}

async fn broadcast_offline(state: &AppState, sender: Profile, receiver_id: Uuid) {
    let sender_id = sender.id;
    let frame = ServerEvent::offline(sender).to_json();
    state.registry.send_to_pair(sender_id, receiver_id, &frame).await;
}

impl ChatSession {
    /// Connection-fatal path: announce the sender offline to the pair and
    /// stop this actor. `stopped()` takes care of unregistration.
    fn fail(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let state = self.state.clone();
        let sender = self.sender.clone();
        let receiver_id = self.receiver_id;
        actix::spawn(async move {
            broadcast_offline(&state, sender, receiver_id).await;
        });
        ctx.stop();
    }

    fn handle_text_frame(&self, content: String) {
        let state = self.state.clone();
        let sender = self.sender.clone();
        let receiver_id = self.receiver_id;
        actix::spawn(async move {
            // Fan out first; persistence follows so a slow store cannot
            // stall delivery.
            let frame = ServerEvent::Text {
                user: sender.clone(),
                content: content.clone(),
            }
            .to_json();
            state.registry.send_to_pair(sender.id, receiver_id, &frame).await;

            let receiver_email = match state.store.find_user_by_id(receiver_id).await {
                Some(receiver) => receiver.email,
                None => {
                    tracing::warn!(%receiver_id, "dropping text for unknown receiver");
                    return;
                }
            };
            let request = SendMessage {
                receiver: receiver_email,
                kind: MessageKind::Text,
                content,
                media: None,
            };
            match ConversationService::send_message(
                &state.store,
                state.blobs.as_ref(),
                sender.id,
                request,
            )
            .await
            {
                Ok(_) | Err(AppError::Validation(_)) => {}
                Err(e) => tracing::error!(error = %e, "failed to persist broadcast text message"),
            }
        });
    }

    fn handle_media_frame(&self, content: String, ctx: &mut ws::WebsocketContext<Self>) {
        let state = self.state.clone();
        let sender = self.sender.clone();
        let receiver_id = self.receiver_id;
        let addr = ctx.address();
        actix::spawn(async move {
            let Ok(payload) = BASE64.decode(content.as_bytes()) else {
                tracing::warn!(sender = %sender.id, "undecodable media payload, closing connection");
                broadcast_offline(&state, sender, receiver_id).await;
                addr.do_send(Shutdown);
                return;
            };
            if payload.is_empty() {
                // Handled rejection: no broadcast, no persisted message.
                tracing::debug!(sender = %sender.id, "ignoring empty media payload");
                return;
            }
            let Some(receiver) = state.store.find_user_by_id(receiver_id).await else {
                broadcast_offline(&state, sender, receiver_id).await;
                addr.do_send(Shutdown);
                return;
            };

            let request = SendMessage {
                receiver: receiver.email,
                kind: MessageKind::Media,
                content: String::new(),
                media: Some(payload),
            };
            match ConversationService::send_message(
                &state.store,
                state.blobs.as_ref(),
                sender.id,
                request,
            )
            .await
            {
                Ok(message) => {
                    // Broadcast with the raw payload replaced by the
                    // storage reference.
                    let frame = ServerEvent::Media {
                        user: sender.clone(),
                        media: message.media,
                    }
                    .to_json();
                    state.registry.send_to_pair(sender.id, receiver_id, &frame).await;
                }
                Err(AppError::Validation(reason)) => {
                    tracing::debug!(%reason, "media message rejected");
                }
                Err(e) => {
                    tracing::error!(error = %e, "store failure on media message");
                    broadcast_offline(&state, sender, receiver_id).await;
                    addr.do_send(Shutdown);
                }
            }
        });
    }

    /// Transport reported a non-open state: re-register once, wiring a
    /// fresh registry channel to this actor, before resuming the loop.
    fn recover_stale(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let state = self.state.clone();
        let user_id = self.sender.id;
        let old = self.subscriber_id;
        let addr = ctx.address();
        actix::spawn(async move {
            state.registry.unregister(user_id, old).await;
            let (subscriber_id, rx) = state.registry.register(user_id).await;
            addr.do_send(Registered(subscriber_id));
            forward(rx, addr).await;
        });
    }
}

impl Actor for ChatSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(sender = %self.sender.id, receiver = %self.receiver_id,
            "realtime chat session online");
        let state = self.state.clone();
        let sender = self.sender.clone();
        let receiver_id = self.receiver_id;
        actix::spawn(async move {
            let sender_id = sender.id;
            let frame = ServerEvent::online(sender).to_json();
            state.registry.send_to_pair(sender_id, receiver_id, &frame).await;
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(sender = %self.sender.id, "realtime chat session closed");
        let state = self.state.clone();
        let user_id = self.sender.id;
        let subscriber_id = self.subscriber_id;
        actix::spawn(async move {
            state.registry.unregister(user_id, subscriber_id).await;
        });
    }
}

impl Handler<Outbound> for ChatSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl Handler<Registered> for ChatSession {
    type Result = ();

    fn handle(&mut self, msg: Registered, _ctx: &mut Self::Context) {
        self.subscriber_id = msg.0;
    }
}

impl Handler<Shutdown> for ChatSession {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) {
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => match ChatFrame::parse(&text) {
                Ok(ChatFrame::Leave { .. }) => {
                    tracing::info!(sender = %self.sender.id, "peer left the conversation");
                    self.fail(ctx);
                }
                Ok(ChatFrame::Media { content }) => self.handle_media_frame(content, ctx),
                Ok(ChatFrame::Text { content }) => self.handle_text_frame(content),
                Err(e) => {
                    tracing::warn!(error = %e, "undecodable frame, closing connection");
                    self.fail(ctx);
                }
            },
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("binary frames are not part of the chat protocol");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(?reason, "close frame received");
                self.fail(ctx);
            }
            Ok(_) => {}
            Err(e) => {
                if self.stale_retries > 0 {
                    self.stale_retries -= 1;
                    tracing::warn!(error = %e, "transport stale, attempting re-registration");
                    self.recover_stale(ctx);
                } else {
                    tracing::error!(error = %e, "transport failure, closing connection");
                    self.fail(ctx);
                }
            }
        }
    }
}

#[get("/api/v1/ws/chat/{sender_id}/{receiver_id}")]
pub async fn chat_ws(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<WsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (sender_id, receiver_id) = path.into_inner();

    // The path names a presumed sender; the token must resolve to exactly
    // that identity before the upgrade.
    let user = match state.sessions.resolve(&query.token).await {
        Ok(user) if user.id == sender_id => user,
        Ok(_) | Err(_) => {
            tracing::warn!(%sender_id, "rejected realtime handshake");
            return Ok(HttpResponse::Unauthorized().finish());
        }
    };

    let (subscriber_id, rx) = state.registry.register(sender_id).await;
    let session = ChatSession {
        sender: user.profile(),
        receiver_id,
        subscriber_id,
        state: state.get_ref().clone(),
        stale_retries: 1,
    };

    // A failed upgrade must not leave the entry behind in the registry.
    let (addr, response) = match ws::WsResponseBuilder::new(session, &req, stream).start_with_addr()
    {
        Ok(started) => started,
        Err(e) => {
            state.registry.unregister(sender_id, subscriber_id).await;
            return Err(e);
        }
    };
    tokio::spawn(forward(rx, addr));
    Ok(response)
}
