pub mod cache;
pub mod market_hours;
pub mod market_data;
pub mod mock_data;
pub mod db_init;

pub mod live_chart_service;
pub mod live_poller;
pub mod order_validation;
pub mod debounce;

pub mod stocks_service;
pub mod portfolio_service;
pub mod trading_service;
pub mod limit_order_monitor;
pub mod notification_service;
pub mod chat_service;
pub mod sweeper;
