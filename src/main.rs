// src/main.rs

use color_eyre::eyre::{bail, Result};
use tracing::{error, info};

use subscout::core::knowledge_base;
use subscout::{logging, App, Config};

const USAGE: &str = "usage: subscout <domain> [method|preset ...]\n       subscout methods";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(first) = args.first() else {
        bail!(USAGE);
    };

    if first == "methods" {
        let catalog = serde_json::json!({
            "available_methods": knowledge_base::all_methods(),
            "recommendations": knowledge_base::presets(),
        });
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let config = Config::load()?;
    let app = App::new(config)?;
    info!(available = ?app.available_methods(), "Subscout ready.");

    match app.discover(first, &args[1..]).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Request rejected.");
            bail!("{e}\n{USAGE}")
        }
    }
}
