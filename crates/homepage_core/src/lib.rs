pub mod coordinator;
pub mod gate;
pub mod homepage;
pub mod host;
pub mod idle;
pub mod memory;
pub mod moment;
mod placement;
mod reconcile;
pub mod resolver;

pub use coordinator::{Coordinator, CoordinatorHandle, LaunchContext, UrlAction};
pub use gate::{LaunchGate, LaunchToken};
pub use homepage::{
    Homepage, LaunchOutcome, Lifecycle, OpenRequest, SkipReason, Trigger,
    STARTUP_CONFLICT_WARNING,
};
pub use host::{Host, VaultConfig, WorkspaceEvent};
pub use memory::MemoryHost;
pub use placement::opened_panes;
pub use reconcile::{AppliedCache, ViewKey};
pub use resolver::{compute_value, has_required_feature, Target};
