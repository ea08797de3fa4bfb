use mongodb::bson::oid::ObjectId;
use tokio::sync::broadcast;

/// Change notification pushed to connected clients over SSE.
///
/// `user_id == None` goes to everyone.
#[derive(Debug, Clone)]
pub struct ServerEvent {
    pub user_id: Option<ObjectId>,
    pub name: &'static str,
}

pub const ORDERS_UPDATED: &str = "ordersUpdated";
pub const PORTFOLIO_UPDATED: &str = "portfolioUpdated";
pub const NOTIFICATIONS_UPDATED: &str = "notificationsUpdated";

pub type EventSender = broadcast::Sender<ServerEvent>;

pub fn channel() -> (EventSender, broadcast::Receiver<ServerEvent>) {
    broadcast::channel::<ServerEvent>(256)
}

pub fn publish(tx: &EventSender, user_id: ObjectId, names: &[&'static str]) {
    for name in names {
        // nobody listening is not an error
        let _ = tx.send(ServerEvent { user_id: Some(user_id), name });
    }
}

impl ServerEvent {
    pub fn is_for(&self, user_id: &ObjectId) -> bool {
        self.user_id.map(|u| &u == user_id).unwrap_or(true)
    }
}
