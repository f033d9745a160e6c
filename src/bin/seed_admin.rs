//! Out-of-band admin provisioning
//!
//! No API operation can create the first admin: `makeAdmin` itself
//! requires an admin caller. This tool writes the first admin record
//! directly against storage.
//!
//! ```bash
//! seed-admin --mongodb-uri mongodb://localhost:27017 --email root@example.com
//! ```

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelfmark::db::schemas::AdminDoc;
use shelfmark::db::{Database, Filter};

/// Seed the first admin directly against storage
#[derive(Parser, Debug)]
#[command(name = "seed-admin")]
#[command(about = "Promote a registered user to admin, bypassing the API")]
struct SeedArgs {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "shelfmark")]
    mongodb_db: String,

    /// Email of the registered user to promote
    #[arg(long)]
    email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = SeedArgs::parse();

    let db = Database::connect(&args.mongodb_uri, &args.mongodb_db).await?;

    let user = db
        .users
        .find_one(Filter::new().eq("email", args.email.as_str()))
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no user with email {}; register the account first",
                args.email
            )
        })?;

    let existing = db
        .admins
        .find_one(Filter::new().eq("user_id", user.id.as_str()))
        .await?;
    if existing.is_some() {
        anyhow::bail!("user {} is already an admin", args.email);
    }

    let admin_id = db.admins.insert(AdminDoc::new(user.id.clone())).await?;

    info!(admin_id = %admin_id, user_id = %user.id, "Seeded admin");
    println!("Promoted {} (user {}) to admin", args.email, user.id);

    Ok(())
}
