//! Seed demo users and courses into the configured database.
//!
//! ```text
//! DATABASE_URL=postgres://... cargo run --bin seed-demo
//! ```

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use backend::outbound::persistence::{run_migrations, seed_demo};

fn main() -> std::io::Result<()> {
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        std::io::Error::other("DATABASE_URL must point at the PostgreSQL instance")
    })?;

    run_migrations(&database_url).map_err(std::io::Error::other)?;
    seed_demo(&database_url).map_err(std::io::Error::other)?;
    info!("demo data seeded");
    Ok(())
}
