//! Validate command implementation

use crate::cli::utils;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use tracing::info;

pub fn command() -> Command {
    Command::new("validate")
        .about("Validate the configuration, schemas and documents without generating")
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path")
                .value_name("FILE"),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    info!("Validating configuration");

    let config = utils::load_config(matches)?;
    let app = crate::GraphQLGen::new(config)?;
    app.initialize().await?;

    let errors = app.check().await?;
    if errors.is_empty() {
        println!("Configuration, schemas and documents are valid");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("{error}");
        }
        Err(anyhow!("{} document validation error(s) found", errors.len()))
    }
}
