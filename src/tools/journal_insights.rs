use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct JournalInsightsParams {
    #[schemars(description = "Whose journal to analyze. Defaults to the configured user.")]
    pub user: Option<String>,
}
