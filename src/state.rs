/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - gate: RequestGate (verifier + path rules), redirect 用 base URL
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use url::Url;

use crate::gate::RequestGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<RequestGate>,
    pub public_base_url: Option<Arc<Url>>,
}

impl AppState {
    pub fn new(gate: Arc<RequestGate>, public_base_url: Option<Url>) -> Self {
        Self {
            gate,
            public_base_url: public_base_url.map(Arc::new),
        }
    }
}
