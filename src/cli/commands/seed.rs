use anyhow::{bail, Context};

use crate::app::Stores;
use crate::cli::OutputFormat;
use crate::config;
use crate::services::seed::{seed_demo_data, DEMO_EMAIL, DEMO_PASSWORD};

pub async fn handle(reset: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    let stores = Stores::connect(&config::config().database).context("failed to configure database")?;
    if !stores.is_persistent() {
        bail!("seeding the memory backend has no lasting effect; set DATABASE_URL");
    }

    stores.migrate().await.context("failed to apply database schema")?;
    let report = seed_demo_data(stores.accounts.as_ref(), stores.leads.as_ref(), reset)
        .await
        .context("failed to seed demo data")?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if report.account_created {
                println!("Created demo account {} / {}", DEMO_EMAIL, DEMO_PASSWORD);
            }
            if report.leads_removed > 0 {
                println!("Removed {} existing leads", report.leads_removed);
            }
            if report.leads_created == 0 {
                println!("Demo account already seeded; pass --reset to replace its leads");
            } else {
                println!("Created {} sample leads", report.leads_created);
            }
        }
    }
    Ok(())
}
