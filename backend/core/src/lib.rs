pub mod error;
pub mod html;
pub mod registry;
pub mod state;
pub mod version;

pub use error::{BootError, BootResult};
pub use html::escape_html;
pub use registry::CapabilityRegistry;
pub use state::{BootState, BootStateMachine};
pub use version::VersionMetadata;
