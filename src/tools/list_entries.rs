//! MCP `list_entries` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `list_entries` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListEntriesParams {
    #[schemars(description = "Whose journal to read. Defaults to the configured user.")]
    pub user: Option<String>,

    /// Maximum number of entries, newest first.
    #[schemars(description = "Maximum number of entries to return, newest first. Defaults to 20.")]
    pub limit: Option<usize>,
}
