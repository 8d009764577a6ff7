use dotenvy::dotenv;
use food_share::config::{self, database};
use food_share::core::claim::ClaimLifecycle;
use food_share::core::report::{ReportKind, ReportParams, run_report};
use food_share::errors::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Load settings
    let app_config = config::load_app_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let lifecycle = ClaimLifecycle::from_config(&app_config);
    info!(
        quantity_policy = ?lifecycle.policy(),
        "Configuration loaded"
    );

    // 4. Connect, create missing tables and check the live schema
    let db = database::create_connection(&app_config.database_url).await?;
    database::create_tables(&db).await?;
    database::verify_schema(&db)
        .await
        .inspect_err(|e| error!("Database schema check failed: {}", e))?;

    // 5. Print the report catalogue; the first argument limits report 3 to one city
    let params = ReportParams {
        city: std::env::args().nth(1),
    };
    for kind in ReportKind::ALL {
        let table = run_report(&db, kind, &params).await?;
        println!("{table}");
    }

    Ok(())
}
