//! Generate command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

pub fn command() -> Command {
    Command::new("generate")
        .about("Generate all configured outputs")
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path")
                .value_name("FILE"),
        )
        .arg(
            clap::Arg::new("watch")
                .short('w')
                .long("watch")
                .help("Report document validation errors instead of aborting")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("dry-run")
                .long("dry-run")
                .help("Don't write files")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    info!("Starting code generation");

    let mut config = utils::load_config(matches)?;

    // CLI watch flag overrides the config file
    if matches.get_flag("watch") {
        config.watch = true;
    }

    let app = crate::GraphQLGen::new(config)?;
    app.initialize().await?;

    let outputs = app.generate().await?;

    if matches.get_flag("dry-run") {
        println!("Dry run mode - no files were written");
        for output in &outputs {
            println!("  {} ({} bytes)", output.filename, output.content.len());
        }
        return Ok(());
    }

    app.write_outputs(&outputs).await?;
    println!("Generated {} output file(s)", outputs.len());
    Ok(())
}
