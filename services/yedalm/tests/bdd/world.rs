//! BDD test world for yedalm

use std::sync::Arc;

use cucumber::World;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use yedalm::admin::AdminConsole;
use yedalm::entity::{Facility, Organization};
use yedalm::list_view::{DragList, DropResult, PointerDown};
use yedalm::mock::MemoryStore;
use yedalm::page::HomePage;
use yedalm::reorder::ReorderOutcome;
use yedalm::session::SessionRegistry;

use crate::steps::site_steps::RecordingHttpClient;

/// A site served in the background of a scenario
#[derive(Debug)]
pub struct RunningSite {
    pub base_url: String,
    pub cancel: CancellationToken,
    pub task: Option<JoinHandle<yedalm::Result<()>>>,
}

#[derive(Debug, Default, World)]
pub struct YedalmWorld {
    pub store: Option<Arc<MemoryStore>>,

    // Console and reordering
    pub console: Option<Arc<AdminConsole>>,
    pub outcome: Option<ReorderOutcome>,
    pub retried: Option<ReorderOutcome>,
    pub background_reorder: Option<JoinHandle<yedalm::Result<ReorderOutcome>>>,
    pub saved: Option<yedalm::Result<Facility>>,

    // Draggable list
    pub view: Option<DragList<Organization>>,
    pub pointer_down: Option<PointerDown>,
    pub drop: Option<DropResult<Organization>>,

    // Sessions and page
    pub registry: Option<Arc<SessionRegistry>>,
    pub session_token: Option<String>,
    pub login_error: Option<yedalm::YedalmError>,
    pub home: Option<HomePage>,

    // Data API and site lifecycle
    pub http: Option<Arc<RecordingHttpClient>>,
    pub site: Option<RunningSite>,
    pub last_response: Option<(u16, String)>,
}

impl YedalmWorld {
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(self.store.as_ref().expect("store not set"))
    }

    pub fn console(&self) -> Arc<AdminConsole> {
        Arc::clone(self.console.as_ref().expect("console not loaded"))
    }
}

impl Drop for YedalmWorld {
    fn drop(&mut self) {
        if let Some(task) = self.background_reorder.take() {
            task.abort();
        }
        if let Some(site) = &self.site {
            site.cancel.cancel();
        }
    }
}
