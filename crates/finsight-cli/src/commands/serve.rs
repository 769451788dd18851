//! Server command implementation

use std::path::Path;

use anyhow::Result;
use finsight_core::Advisor;
use finsight_server::ServerConfig;

pub async fn cmd_serve(
    advisor: Advisor,
    db_path: &Path,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting Finsight web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if advisor.has_llm() {
        println!("   🤖 LLM advisor enabled");
    }
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }
    println!();

    let config = ServerConfig { allowed_origins };
    finsight_server::serve(advisor, host, port, config).await
}
