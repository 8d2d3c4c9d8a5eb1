use anyhow::{bail, Context};
use serde_json::json;

use crate::app::Stores;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::schema;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let stores = Stores::connect(&config::config().database).context("failed to configure database")?;
    if !stores.is_persistent() {
        bail!("migrate needs the postgres backend; set DATABASE_URL");
    }

    stores.migrate().await.context("failed to apply database schema")?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "applied": schema::STATEMENTS.len() })),
        OutputFormat::Text => println!("Applied {} schema statements", schema::STATEMENTS.len()),
    }
    Ok(())
}
