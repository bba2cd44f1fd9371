// Engine library root

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod notification;
pub mod services;
pub mod signals;

pub use analysis::analyze_series;
pub use error::{EngineError, Result};
pub use indicators::IndicatorEngine;
pub use signals::SignalReducer;
