use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::{config::AppConfig, gateway::ChatCompletions};

/// Estado compartido entre handlers. Todo es de solo lectura salvo el emisor
/// de apagado, que se consume una única vez.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gateway: Arc<dyn ChatCompletions>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}
