use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;
use tokio::runtime::{Builder, Runtime};

use crate::config::Config;
use crate::model::ClassData;
use crate::narrative::NarrativeClient;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the sidecar owns between requests. `class_data` is the current
/// snapshot; handlers replace it wholesale and never mutate it in place.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub class_data: Option<ClassData>,
    pub runtime: Option<Runtime>,
    pub narrative: Option<NarrativeClient>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let runtime = match Builder::new_current_thread().enable_all().build() {
            Ok(rt) => Some(rt),
            Err(e) => {
                tracing::warn!("narrative runtime unavailable: {e}");
                None
            }
        };
        let narrative = match NarrativeClient::new(config.narrative.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("narrative client unavailable: {e}");
                None
            }
        };
        if config.narrative.api_key.is_none() {
            tracing::info!("no narrative API key configured; generated text will fall back");
        }

        Self {
            workspace: None,
            db: None,
            class_data: None,
            runtime,
            narrative,
        }
    }
}
