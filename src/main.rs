//! Endee command line helper.
//!
//! Reads `.env`, then `endee.*` / `ENDEE__*` configuration, and runs one
//! index management command:
//!
//! ```text
//! endee [list]
//! endee info <index>
//! endee delete <index>
//! ```

use anyhow::bail;
use endee::{ClientConfig, Endee};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logs = std::env::var("ENDEE_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    endee::init_tracing("info", json_logs)?;

    let config = ClientConfig::load()?;
    tracing::info!(base_url = %config.base_url, "connecting");
    let endee = Endee::new(config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["list"] => {
            let indexes = endee.list_indexes().await?;
            println!("{}", serde_json::to_string_pretty(&indexes)?);
        }
        ["info", name] => {
            let info = endee.index_info(name).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        ["delete", name] => {
            println!("{}", endee.delete_index(name).await?);
        }
        other => bail!("unknown command: {}", other.join(" ")),
    }

    Ok(())
}
