//! Change signal transport

use collab_types::ProgramChanged;
use tokio::sync::broadcast;

/// Sink for committed program changes.
///
/// Called once per successful commit, after the commit. Implementations must
/// not block; delivery is best effort.
pub trait ChangeNotifier: Send + Sync {
    fn publish(&self, change: ProgramChanged);
}

/// Fans changes out over a tokio broadcast channel
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<ProgramChanged>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgramChanged> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<ProgramChanged> {
        self.tx.clone()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn publish(&self, change: ProgramChanged) {
        let program_id = change.program_id.clone();
        if self.tx.send(change).is_err() {
            // No subscribers right now
            tracing::trace!(program_id = %program_id, "program change dropped");
        }
    }
}
