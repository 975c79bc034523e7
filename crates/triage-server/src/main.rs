//! Triage server binary

use anyhow::Result;
use clap::Parser;
use triage_core::config::{
    AppConfig, DEFAULT_ADMIN_TOKEN, DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_STATIC_ROOT,
};

#[derive(Parser, Debug)]
#[command(name = "triage")]
#[command(author, version, about = "Report submission server", long_about = None)]
struct Cli {
    /// Shared token for the spreadsheet download and admin page
    #[arg(long, env = "ADMIN_TOKEN", default_value = DEFAULT_ADMIN_TOKEN, hide_env_values = true)]
    admin_token: String,

    /// Directory holding reports.db and reports.xlsx
    #[arg(long, env = "TRIAGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Directory served for any path without an API route
    #[arg(long, env = "TRIAGE_STATIC_ROOT", default_value = DEFAULT_STATIC_ROOT)]
    static_root: String,

    /// Listen address
    #[arg(long, env = "TRIAGE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Listen port
    #[arg(long, short, env = "TRIAGE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

impl Cli {
    fn into_config(self) -> Result<AppConfig> {
        Ok(AppConfig::build(
            self.admin_token,
            &self.data_dir,
            &self.static_root,
            &self.host,
            self.port,
        )?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config()?;
    triage_server::serve(config).await
}
