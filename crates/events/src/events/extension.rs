use serde::{Deserialize, Serialize};

/// Extension configuration events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExtensionEvent {
    /// A configuration strategy was chosen for the platform
    StrategySelected { platform: String, strategy: String },

    /// The final extension configuration is ready
    Configured {
        macros: usize,
        include_dirs: usize,
        static_objects: usize,
    },
}
