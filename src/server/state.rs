use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::diary::DiaryService;
use crate::core::picker::ResponsePicker;

use super::error::ServerResult;
use super::session::SessionRegistry;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    pub picker: ResponsePicker,
    pub diary: DiaryService,
    pub sessions: SessionRegistry,
    /// Commands served as `GET /{command}`.
    pub commands: Vec<String>,
    /// Episodes shown on the panel.
    pub panel_recent_limit: usize,
}

impl AppState {
    pub fn new(
        picker: ResponsePicker,
        diary: DiaryService,
        sessions: SessionRegistry,
        commands: Vec<String>,
        panel_recent_limit: usize,
    ) -> Self {
        Self {
            picker,
            diary,
            sessions,
            commands,
            panel_recent_limit,
        }
    }

    pub fn from_config(config: &AppConfig) -> ServerResult<Arc<Self>> {
        let diary = DiaryService::from_config(config)?;
        Ok(Arc::new(Self::new(
            ResponsePicker::from_config(&config.responses),
            diary,
            SessionRegistry::new(Duration::from_secs(config.server.session_ttl_secs)),
            config.responses.commands.clone(),
            config.server.panel_recent_limit,
        )))
    }
}
