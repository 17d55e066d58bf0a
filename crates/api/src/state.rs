use std::sync::Arc;

use exam_core::repo::Repository;
use jobs::InMemJobs;
use parking_lot::RwLock;
use solver_greedy::GreedySolver;
use types::Schedule;

/// Live entity store plus the committed schedule. Both sit behind one lock
/// so a commit or a move never interleaves with a roster edit.
pub struct Workspace {
    pub repo: Repository,
    pub schedule: Option<Schedule>,
}

#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<RwLock<Workspace>>,
    pub jobs: Arc<InMemJobs<GreedySolver>>,
}

impl AppState {
    pub fn new_default() -> Self {
        Self {
            workspace: Arc::new(RwLock::new(Workspace {
                repo: Repository::new(),
                schedule: None,
            })),
            jobs: Arc::new(InMemJobs::new(GreedySolver::new())),
        }
    }
}
