pub mod app;
pub mod config;
pub mod event;
pub mod form;
pub mod ui;

pub use crate::app::App;
pub use crate::event::{Event, EventHandler};
