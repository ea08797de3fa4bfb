use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: i64,
    pub average_price: f64,
    pub last_updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(serialize_with = "mongodb::bson::serde_helpers::serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
    pub fee: f64,
    // cash moved: cost for buys, proceeds for sells, new balance for resets
    pub total: f64,
    #[serde(default)]
    pub order_id: Option<String>,
    pub timestamp: i64,
}

/// The virtual-money portfolio of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMoney {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub balance: f64,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub created_at: i64,
    // millis, used as a write guard
    pub updated_at: i64,
}

// cash amounts are kept to the cent, the same way order amounts are quoted
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn err(field: &str, msg: &str) -> FieldErrors {
    let mut errs = FieldErrors::new();
    errs.insert(field.to_string(), msg.to_string());
    errs
}

impl VirtualMoney {
    pub fn new(user_id: ObjectId, balance: f64, now_ms: i64) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            balance,
            holdings: vec![],
            transactions: vec![],
            created_at: now_ms / 1000,
            updated_at: now_ms,
        }
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn held_quantity(&self, symbol: &str) -> i64 {
        self.holding(symbol).map(|h| h.quantity).unwrap_or(0)
    }

    /// Debits `qty * price + fee` and grows (or opens) the holding.
    pub fn apply_buy(
        &mut self,
        symbol: &str,
        qty: i64,
        price: f64,
        fee: f64,
        order_id: Option<String>,
        now_ms: i64,
    ) -> Result<Transaction, FieldErrors> {
        if qty <= 0 {
            return Err(err("quantity", "Enter a valid quantity."));
        }

        let gross = round2(price * qty as f64);
        let cost = round2(gross + fee);
        if cost > self.balance {
            return Err(err("balance", "Insufficient funds."));
        }

        let sym = symbol.to_uppercase();
        let now = now_ms / 1000;

        match self.holdings.iter_mut().find(|h| h.symbol == sym) {
            Some(h) => {
                let new_qty = h.quantity + qty;
                h.average_price = (h.average_price * h.quantity as f64 + gross) / new_qty as f64;
                h.quantity = new_qty;
                h.last_updated = now;
            }
            None => self.holdings.push(Holding {
                symbol: sym.clone(),
                quantity: qty,
                average_price: price,
                last_updated: now,
            }),
        }

        self.balance = round2(self.balance - cost);
        self.updated_at = now_ms;

        let tx = Transaction {
            id: ObjectId::new(),
            kind: TransactionKind::Buy,
            symbol: sym,
            quantity: qty,
            price,
            fee,
            total: cost,
            order_id,
            timestamp: now,
        };
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Credits `qty * price - fee` and shrinks the holding, dropping it at zero.
    pub fn apply_sell(
        &mut self,
        symbol: &str,
        qty: i64,
        price: f64,
        fee: f64,
        order_id: Option<String>,
        now_ms: i64,
    ) -> Result<Transaction, FieldErrors> {
        if qty <= 0 {
            return Err(err("quantity", "Enter a valid quantity."));
        }

        let sym = symbol.to_uppercase();
        let Some(idx) = self.holdings.iter().position(|h| h.symbol == sym) else {
            return Err(err("quantity", "You have no position to sell."));
        };

        if self.holdings[idx].quantity < qty {
            return Err(err("quantity", "You don't have that many shares."));
        }

        let now = now_ms / 1000;
        let proceeds = round2(round2(price * qty as f64) - fee);

        self.holdings[idx].quantity -= qty;
        self.holdings[idx].last_updated = now;
        if self.holdings[idx].quantity == 0 {
            self.holdings.remove(idx);
        }

        self.balance = round2(self.balance + proceeds);
        self.updated_at = now_ms;

        let tx = Transaction {
            id: ObjectId::new(),
            kind: TransactionKind::Sell,
            symbol: sym,
            quantity: qty,
            price,
            fee,
            total: proceeds,
            order_id,
            timestamp: now,
        };
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Back to the starting balance with no holdings. History is kept.
    pub fn reset(&mut self, starting_balance: f64, now_ms: i64) -> Transaction {
        self.balance = starting_balance;
        self.holdings.clear();
        self.updated_at = now_ms;

        let tx = Transaction {
            id: ObjectId::new(),
            kind: TransactionKind::Reset,
            symbol: String::new(),
            quantity: 0,
            price: 0.0,
            fee: 0.0,
            total: starting_balance,
            order_id: None,
            timestamp: now_ms / 1000,
        };
        self.transactions.push(tx.clone());
        tx
    }
}
