pub mod config;
pub mod error;
pub mod explore;
pub mod logging;
pub mod pipeline;

pub mod data {
    pub mod columnar;
    pub mod loader;
    pub mod metric;
    pub mod shaped;
    pub mod utils;
}

pub mod plot {
    pub mod chart;
    pub mod draw;
    pub mod export;
    pub mod paths;
    pub mod plot_set;
}

pub use error::{Error, Result};
