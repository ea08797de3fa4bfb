//! Client-side pieces: a poller source that talks to a running backend over
//! HTTP, and a debounced order form.

pub mod chart_api;
pub mod order_form;

pub use chart_api::ChartApiClient;
pub use order_form::OrderForm;
