use std::sync::Arc;
use scadsrv_core::Renderer;

/// Shared application state
pub struct AppState {
    renderer: Arc<dyn Renderer>,
}

impl AppState {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }
}
