mod chart;
mod collaborators;
mod component;
mod config;
mod controller;
mod error;
mod layout;
mod reconcile;
mod render;
mod state;
mod tree;
mod types;

pub use collaborators::Collaborators;
pub use component::OrgChartCanvas;
pub use config::ChartConfig;
pub use error::LoadError;
pub use tree::ChartNode;
pub use types::PersonRecord;
