use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WriteEntryParams {
    #[schemars(description = "The journal entry text, at least ten words")]
    pub text: String,

    #[schemars(description = "Whose journal to write to. Defaults to the configured user.")]
    pub user: Option<String>,
}
