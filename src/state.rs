use crate::api::ChatApi; // Import trait
use crate::models::ChatState;
use crate::store::Store;
use std::sync::Arc;

// Chat state shared with every UI component of a session.
// Constructed once and handed out by clone instead of living in a global.
#[derive(Clone)]
pub struct AppState {
    pub store: Store<ChatState>,
    pub api: Arc<dyn ChatApi>, // Hold the trait object
}

impl AppState {
    /// Starts from the initial chat state.
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self::with_state(api, ChatState::default())
    }

    pub fn with_state(api: Arc<dyn ChatApi>, state: ChatState) -> Self {
        Self {
            store: Store::new(state),
            api,
        }
    }

    /// Snapshot of the current chat state.
    pub fn snapshot(&self) -> ChatState {
        self.store.get()
    }
}
