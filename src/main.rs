use chrono::Utc;
use dotenvy::dotenv;
use regional_tally::{
    config::{self, database},
    core::{
        access::{self, Action, PinTable, Role},
        branch, entry,
        period::{Granularity, format_amount},
        report::{self, ReportQuery},
    },
    errors::Result,
    live::LiveDashboard,
};
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

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    let zone = app_config.region.zone()?;

    // 4. Initialize database and seed branches
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    branch::seed_branches(&db, &app_config.branches)
        .await
        .inspect(|_| info!("Branches seeded successfully."))
        .inspect_err(|e| error!("Failed to seed branches: {}", e))?;

    // 5. Resolve the operator's role from TALLY_PIN (public when unset)
    let pins = PinTable::from_config(&app_config.access);
    let role = match std::env::var("TALLY_PIN") {
        Ok(pin) => access::sign_in(&pins, &pin)
            .inspect_err(|e| error!("TALLY_PIN rejected: {}", e))?,
        Err(_) => Role::Public,
    };
    info!(%role, "Signed in");

    // 6. Admins get this week's figures in the log
    if access::is_allowed(&role, Action::ViewReports) {
        let query = ReportQuery::current_week(Granularity::Week, Utc::now(), &zone);
        let rows = report::generate_report(&db, &role, query, &zone).await?;
        for (period, total) in report::period_totals(&rows) {
            info!(%period, total = %format_amount(total), "Current week");
        }
    }

    // 7. Recent entries the role may see
    let branches = branch::list_branches(&db).await?;
    for recent in entry::list_recent_entries(&db, &role).await? {
        info!("{}", entry::entry_line(&recent, &branches, &zone));
    }

    // 8. Run the live dashboard until Ctrl-C
    let live = LiveDashboard::spawn(
        db.clone(),
        role,
        app_config.region.featured_branch.clone(),
        app_config.dashboard.refresh_interval(),
    );
    let mut snapshots = live.subscribe();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(snapshot) = snapshots.borrow_and_update().as_ref() {
                    println!("\n== {} ==\n{snapshot}", app_config.region.name);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutting down.");
                break;
            }
        }
    }

    live.stop().await;
    db.close().await?;
    Ok(())
}
