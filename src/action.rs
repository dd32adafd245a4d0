use serde_json::Value;

use crate::listing::{FetchTicket, LoadError};

/// Which incremental list a fetch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListId {
    Tests,
    Branches,
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    Select,

    // Terminal
    /// New terminal height.
    Resize(u16),
    Wheel(i16),

    // Test list
    LoadTests,
    Refresh,

    // Pricing modal
    ToggleBranchDropdown,

    // Pagination: result of a background page fetch
    PageFetched {
        list: ListId,
        ticket: FetchTicket,
        result: Result<Value, LoadError>,
    },

    None,
}
