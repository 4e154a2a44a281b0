use anyhow::Result;
use std::sync::Arc;

use localsearch_core::SearchCore;
use localsearch_core::mcp::LocalSearchMcpServer;

pub async fn run(core: Arc<SearchCore>) -> Result<()> {
    LocalSearchMcpServer::new(core).run().await
}
