use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use serde::{Deserialize, Serialize};

const CONNECTED_MESSAGE: &str = "Connected to real-time updates";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SubscribeStock { symbol: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected { message: String },
    StockUpdate { symbol: String, status: String },
    Error { message: String },
}

/// Reply to one text frame. Subscriptions are acknowledged only; nothing is streamed.
pub fn reply_to(text: &str) -> ServerEvent {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(err) => {
            return ServerEvent::Error {
                message: format!("invalid event: {err}"),
            }
        }
    };

    match event {
        ClientEvent::SubscribeStock { symbol } => ServerEvent::StockUpdate {
            symbol,
            status: "subscribed".to_string(),
        },
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(handle_socket)
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode websocket event");
            return false;
        }
    };
    socket.send(Message::Text(text)).await.is_ok()
}

async fn handle_socket(mut socket: WebSocket) {
    tracing::info!("websocket client connected");

    let hello = ServerEvent::Connected {
        message: CONNECTED_MESSAGE.to_string(),
    };
    if !send_event(&mut socket, &hello).await {
        return;
    }

    while let Some(msg) = socket.recv().await {
        let reply = match msg {
            Ok(Message::Text(text)) => reply_to(&text),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                tracing::debug!(error = %err, "websocket receive failed");
                break;
            }
        };

        if let ServerEvent::StockUpdate { symbol, .. } = &reply {
            tracing::info!(%symbol, "websocket subscription acknowledged");
        }
        if !send_event(&mut socket, &reply).await {
            break;
        }
    }

    tracing::info!("websocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn acknowledges_subscription() {
        let reply = reply_to(r#"{"event": "subscribe_stock", "data": {"symbol": "aapl"}}"#);
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"event": "stock_update", "data": {"symbol": "aapl", "status": "subscribed"}})
        );
    }

    #[test]
    fn connected_event_shape() {
        let hello = ServerEvent::Connected {
            message: CONNECTED_MESSAGE.to_string(),
        };
        assert_eq!(
            serde_json::to_value(&hello).unwrap(),
            json!({"event": "connected", "data": {"message": "Connected to real-time updates"}})
        );
    }

    #[test]
    fn rejects_unknown_and_malformed_events() {
        for text in [
            r#"{"event": "unsubscribe", "data": {}}"#,
            r#"{"event": "subscribe_stock"}"#,
            "not json",
        ] {
            assert!(matches!(reply_to(text), ServerEvent::Error { .. }), "{text}");
        }
    }

    #[test]
    fn echoes_subscribed_symbol_unchanged() {
        let reply = reply_to(r#"{"event": "subscribe_stock", "data": {"symbol": "VERYLONGTICKER"}}"#);
        assert_eq!(
            reply,
            ServerEvent::StockUpdate {
                symbol: "VERYLONGTICKER".to_string(),
                status: "subscribed".to_string(),
            }
        );
    }
}
