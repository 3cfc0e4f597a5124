//! Polymarket WebSocket push worker.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::domain::{MarketId, OrderBook, PriceLevel, Venue};
use crate::error::Result;
use crate::ingestion::events::IngestionEvent;

use super::types::{SubscribeMessage, WsMessage};

/// Runs until `stop` is notified or the connection drops. Does not
/// reconnect on its own; the orchestrator's worker loop restarts it with
/// backoff (§5, "push transports are a separate worker with
/// reconnect-with-backoff").
pub async fn run(
    url: &str,
    token_to_market: HashMap<String, MarketId>,
    sink: mpsc::Sender<IngestionEvent>,
    stop: Arc<Notify>,
) -> Result<()> {
    info!(url = %url, "connecting to polymarket websocket");
    let (mut ws, response) = connect_async(url).await?;
    info!(status = %response.status(), "polymarket websocket connected");

    let asset_ids: Vec<String> = token_to_market.keys().cloned().collect();
    let subscribe = SubscribeMessage::new(asset_ids.clone());
    ws.send(Message::Text(serde_json::to_string(&subscribe)?)).await?;
    info!(assets = asset_ids.len(), "subscribed to polymarket assets");

    loop {
        tokio::select! {
            _ = stop.notified() => {
                info!("polymarket push worker stopping");
                return Ok(());
            }
            frame = ws.next() => {
                let Some(frame) = frame else {
                    let _ = sink.send(IngestionEvent::Disconnected {
                        venue: Venue::Polymarket,
                        reason: "stream ended".into(),
                    }).await;
                    return Ok(());
                };
                match frame {
                    Ok(Message::Text(text)) => {
                        debug!(raw = %text, "received polymarket message");
                        match serde_json::from_str::<WsMessage>(&text) {
                            Ok(WsMessage::Book(book_msg)) => {
                                if let Some(market_id) = token_to_market.get(&book_msg.asset_id) {
                                    let bids = parse_levels(&book_msg.bids);
                                    let asks = parse_levels(&book_msg.asks);
                                    let book = OrderBook::with_levels(
                                        market_id.clone(),
                                        bids,
                                        asks,
                                        chrono::Utc::now(),
                                        0,
                                    );
                                    let _ = sink.send(IngestionEvent::OrderBook {
                                        venue: Venue::Polymarket,
                                        external_id: market_id.external_id().to_string(),
                                        book,
                                    }).await;
                                }
                            }
                            Ok(WsMessage::PriceChange(_) | WsMessage::Unknown) => {}
                            Err(e) => {
                                warn!(error = %e, raw = %text, "failed to parse polymarket message");
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        if ws.send(Message::Pong(data)).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        info!(frame = ?frame, "polymarket websocket closed by server");
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "polymarket websocket error");
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn parse_levels(levels: &[super::types::WirePriceLevel]) -> Vec<PriceLevel> {
    levels
        .iter()
        .filter_map(|l| {
            let price = l.price.parse().ok()?;
            let size = l.size.parse().ok()?;
            Some(PriceLevel::new(price, size))
        })
        .collect()
}
