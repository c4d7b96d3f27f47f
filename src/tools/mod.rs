pub mod journal_insights;
pub mod list_entries;
pub mod write_entry;

use journal_insights::JournalInsightsParams;
use list_entries::ListEntriesParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use write_entry::WriteEntryParams;

use memoir::config::MemoirConfig;
use memoir::journal::insights::{self, InsightsOptions};
use memoir::journal::reflect::{self, Resolver};
use memoir::journal::store;

const DEFAULT_LIST_LIMIT: usize = 20;

/// The memoir MCP tool handler. Holds shared state (db connection, resolver,
/// config, parsed insights options) and exposes the journal tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct MemoirTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    resolver: Arc<Resolver>,
    config: Arc<MemoirConfig>,
    insights: Arc<InsightsOptions>,
}

#[tool_router]
impl MemoirTools {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        resolver: Arc<Resolver>,
        config: Arc<MemoirConfig>,
        insights: Arc<InsightsOptions>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            resolver,
            config,
            insights,
        }
    }

    fn user(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.config.storage.default_user.clone())
    }

    /// Annotate and store a journal entry.
    #[tool(description = "Write a journal entry. Returns its sentiment, summary, tags and, when one exists, the most recent earlier entry that felt similar.")]
    async fn write_entry(
        &self,
        Parameters(params): Parameters<WriteEntryParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user);
        tracing::info!(user = %user, text_len = params.text.len(), "write_entry called");

        let annotated = reflect::write_entry(&self.db, &self.resolver, &user, &params.text)
            .await
            .map_err(|e| e.to_string())?;

        serde_json::to_string(&annotated).map_err(|e| format!("serialization failed: {e}"))
    }

    /// List recent journal entries.
    #[tool(description = "List journal entries, newest first.")]
    async fn list_entries(
        &self,
        Parameters(params): Parameters<ListEntriesParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user);
        let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        tracing::info!(user = %user, limit, "list_entries called");

        let db = Arc::clone(&self.db);
        let entries = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            Ok::<_, anyhow::Error>(store::recent_entries(&conn, &user, limit)?)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("list failed: {e}"))?;

        serde_json::to_string(&serde_json::json!({
            "entries": entries,
            "total": entries.len(),
        }))
        .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Mood distribution, streak, trend and recurring tags for a journal.
    #[tool(description = "Get journal insights: mood distribution, writing streak, recent trend with a short narrative, top recurring tags and the mood timeline.")]
    async fn journal_insights(
        &self,
        Parameters(params): Parameters<JournalInsightsParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user);
        tracing::info!(user = %user, "journal_insights called");

        let db = Arc::clone(&self.db);
        let entries = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            Ok::<_, anyhow::Error>(store::list_entries(&conn, &user)?)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("insights failed: {e}"))?;

        let report = insights::insights(&entries, &self.insights);
        serde_json::to_string(&report).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for MemoirTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "memoir is a personal journal. Use write_entry to record an entry, \
                 list_entries to read past entries, and journal_insights for mood trends."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
