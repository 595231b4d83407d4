//! `/ws` progress-event stream (§6). Client sends `subscribe_campaign`/
//! `unsubscribe_campaign` frames naming a campaign; server frames carry
//! `{id, timestamp, type, sequenceNumber, campaignId?, data}`.

use crate::stringify::stringify_integers;
use crate::ApiState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use domainflow_broadcast::{Event, Subscription};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn router() -> Router<ApiState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    SubscribeCampaign { campaign_id: Uuid },
    UnsubscribeCampaign { campaign_id: Uuid },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerFrame {
    id: Uuid,
    timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "type")]
    type_name: &'static str,
    sequence_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    campaign_id: Option<Uuid>,
    data: serde_json::Value,
}

async fn handle_socket(socket: WebSocket, state: ApiState) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = Uuid::new_v4();
    tracing::info!(%client_id, "websocket client connected");

    // One subscriber per connection; campaign filters are applied
    // locally by re-subscribing to `All` the moment the client asks for
    // more than one campaign, since `Subscriber` only holds one predicate
    // (§4.10 allows either `all` or a single `campaign={id}` filter).
    let mut subscriber = state.broadcaster.subscribe(Subscription::All);
    let mut watching: Option<Uuid> = None;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::SubscribeCampaign { campaign_id }) => {
                                watching = Some(campaign_id);
                                subscriber = state.broadcaster.subscribe(Subscription::Campaign(campaign_id));
                                tracing::info!(%client_id, %campaign_id, "subscribed");
                            }
                            Ok(ClientMessage::UnsubscribeCampaign { campaign_id }) => {
                                if watching == Some(campaign_id) {
                                    watching = None;
                                    subscriber = state.broadcaster.subscribe(Subscription::All);
                                }
                                tracing::info!(%client_id, %campaign_id, "unsubscribed");
                            }
                            Err(e) => {
                                tracing::warn!(%client_id, error = %e, "invalid client frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(%client_id, "websocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(%client_id, error = %e, "websocket error");
                        break;
                    }
                    _ => {}
                }
            }
            event = subscriber.recv() => {
                match event {
                    Some(event) => {
                        if sender.send(Message::Text(frame_text(&event))).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        tracing::info!(%client_id, "event stream closed");
                        break;
                    }
                }
            }
        }
    }
}

fn frame_text(event: &Event) -> axum::extract::ws::Utf8Bytes {
    let mut data = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
    stringify_integers(&mut data);
    let frame = ServerFrame {
        id: Uuid::new_v4(),
        timestamp: chrono::Utc::now(),
        type_name: event.type_name(),
        sequence_number: event.sequence_number(),
        campaign_id: event.campaign_id(),
        data,
    };
    serde_json::to_string(&frame).unwrap_or_default().into()
}
