use std::sync::Arc;

use crate::bot::connector::BotConnector;
use crate::bot::handler::BotHandler;
use crate::config::Config;
use crate::notifications::{NotificationDispatcher, RetryPolicy};
use crate::search::NominationSearch;
use crate::storage::Repositories;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repos: Repositories,
    /// Managed search index, or a table scan when none is configured.
    pub search: Arc<dyn NominationSearch>,
    pub connector: Arc<dyn BotConnector>,
    pub notifier: NotificationDispatcher,
    pub bot: BotHandler,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Repositories,
        search: Arc<dyn NominationSearch>,
        connector: Arc<dyn BotConnector>,
    ) -> Self {
        let notifier = NotificationDispatcher::new(
            repos.clone(),
            connector.clone(),
            config.bot.clone(),
            RetryPolicy::default(),
        );
        let bot = BotHandler::new(
            config.bot.clone(),
            repos.clone(),
            search.clone(),
            connector.clone(),
        );
        Self {
            config,
            repos,
            search,
            connector,
            notifier,
            bot,
        }
    }
}
