use super::types::Turn;
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only log of rendered turns, shared between the controller and the GUI
#[derive(Debug, Clone)]
pub struct TurnLog {
    turns: Arc<RwLock<Vec<Turn>>>,
}

impl TurnLog {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn append(&self, turn: Turn) {
        self.turns.write().push(turn);
    }

    pub fn get_all(&self) -> Vec<Turn> {
        self.turns.read().clone()
    }
}

impl Default for TurnLog {
    fn default() -> Self {
        Self::new()
    }
}
