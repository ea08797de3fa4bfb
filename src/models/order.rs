use std::fmt;
use std::str::FromStr;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderMethod {
    #[default]
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    Rejected,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub symbol: String,
    pub side: OrderSide,
    pub method: OrderMethod,
    pub quantity: i64,
    // fill price once completed, limit price while pending
    pub price: f64,
    pub fee: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: i64,
    #[serde(default)]
    pub filled_at: Option<i64>,
}

/// JSON shape returned to clients (hex ids instead of extended json).
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub method: OrderMethod,
    pub quantity: i64,
    pub price: f64,
    pub fee: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub created_at: i64,
    pub filled_at: Option<i64>,
}

impl From<Order> for OrderView {
    fn from(o: Order) -> Self {
        Self {
            id: o.id.to_hex(),
            symbol: o.symbol,
            side: o.side,
            method: o.method,
            quantity: o.quantity,
            price: o.price,
            fee: o.fee,
            total: o.total,
            status: o.status,
            reason: o.reason,
            created_at: o.created_at,
            filled_at: o.filled_at,
        }
    }
}
