//! Terminal admin panel for WhatsApp polls managed by a remote action walker.
//!
//! The panel itself holds no poll logic. It validates the dispatch form, keeps
//! one cached page of poll summaries per session, and forwards everything else
//! to the backend through [`network::ActionGateway`].

pub mod app;
pub mod config;
pub mod config_panel;
pub mod detail;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod models;
pub mod network;
pub mod polls;
pub mod theme;
pub mod ui;
pub mod utils;

pub use error::PanelError;
pub use network::{ActionGateway, GatewayError, HttpGateway};
