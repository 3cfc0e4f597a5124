//! Polymarket wire types (CLOB REST + WS), kept separate from the domain
//! types they normalize into.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MarketsResponse {
    pub data: Option<Vec<WireMarket>>,
}

#[derive(Debug, Deserialize)]
pub struct WireMarket {
    pub condition_id: String,
    pub question: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub end_date_iso: Option<String>,
    pub tokens: Vec<WireToken>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub minimum_order_size: Option<String>,
    #[serde(default)]
    pub minimum_tick_size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireToken {
    pub token_id: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePriceLevel {
    pub price: String,
    pub size: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderBookResponse {
    pub bids: Vec<WirePriceLevel>,
    pub asks: Vec<WirePriceLevel>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl SubscribeMessage {
    pub fn new(asset_ids: Vec<String>) -> Self {
        Self {
            assets_ids: asset_ids,
            msg_type: "market".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event_type")]
pub enum WsMessage {
    #[serde(rename = "book")]
    Book(BookMessage),
    #[serde(rename = "price_change")]
    PriceChange(serde_json::Value),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct BookMessage {
    pub asset_id: String,
    pub bids: Vec<WirePriceLevel>,
    pub asks: Vec<WirePriceLevel>,
}
