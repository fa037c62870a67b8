//! Init command implementation

use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use std::path::PathBuf;

const STARTER_CONFIG: &str = r#"# graphql-gen configuration
schema: schema.graphql
documents: "src/**/*.graphql"
generates:
  generated/schema.out.graphql:
    plugins:
      - schema-ast
  generated/introspection.json:
    plugins:
      - introspection
"#;

pub fn command() -> Command {
    Command::new("init")
        .about("Create a starter configuration file")
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Configuration file to create")
                .value_name("FILE")
                .default_value("graphql-gen.yml"),
        )
        .arg(
            clap::Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing configuration file")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("missing output path"))?;

    if path.exists() && !matches.get_flag("force") {
        return Err(anyhow!(
            "'{}' already exists; use --force to overwrite",
            path.display()
        ));
    }

    tokio::fs::write(&path, STARTER_CONFIG).await?;
    println!("Created {}", path.display());
    Ok(())
}
