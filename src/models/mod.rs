pub mod user;
pub mod candle;
pub mod order;
pub mod portfolio;
pub mod notification;

pub use user::CurrentUser;
pub use candle::{Candle, DataSource};
pub use order::{Order, OrderMethod, OrderSide, OrderStatus, OrderView};
pub use portfolio::{Holding, Transaction, TransactionKind, VirtualMoney};
pub use notification::{Notification, NotificationKind, NotificationView};
