//! Contention Load Test
//!
//! Creates one user, then fires concurrent updates that all carry the same
//! expected version. Exactly one should win; the rest must conflict.
//!
//! Run with: cargo run --bin load_test --release -- --writers 50

use std::time::Instant;

use sqlx::postgres::PgPoolOptions;
use versioned_users::{
    CreateUserParams, OperationContext, PgUserStore, ServiceError, UpdateUserParams, UserField,
    UserService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let writers: u32 = args
        .iter()
        .position(|a| a == "--writers")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);

    let database_url = std::env::var("DATABASE_URL")?;

    println!("Contention Test - {} concurrent writers on one user", writers);
    println!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(writers.clamp(2, 50))
        .connect(&database_url)
        .await?;

    let service = UserService::new(PgUserStore::new(pool));
    let ctx = OperationContext::new();

    let nickname = format!("load-{}", uuid::Uuid::new_v4());
    let user = service
        .create_user(&ctx, CreateUserParams::new(nickname).with_country("uk"))
        .await?;
    let expected_version = user.version();

    let start = Instant::now();

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let service = service.clone();
            let params = UpdateUserParams::new(user.id(), expected_version)
                .with(UserField::Country, format!("c{}", i));
            tokio::spawn(async move { service.update_user(&OperationContext::new(), params).await })
        })
        .collect();

    let (mut succeeded, mut conflicted, mut failed) = (0u32, 0u32, 0u32);
    for handle in handles {
        match handle.await? {
            Ok(_) => succeeded += 1,
            Err(ServiceError::VersionConflict(_)) => conflicted += 1,
            Err(e) => {
                failed += 1;
                eprintln!("Unexpected error: {}", e);
            }
        }
    }

    let elapsed = start.elapsed();
    let final_user = service.get_user(&ctx, user.id()).await?;

    println!("\n=== Contention Test Results ===");
    println!("Writers: {}", writers);
    println!("Succeeded: {}", succeeded);
    println!("Conflicted: {}", conflicted);
    println!("Failed: {}", failed);
    println!("Final version: {}", final_user.version());
    println!("Time: {:.2}s", elapsed.as_secs_f64());

    if succeeded != 1 {
        anyhow::bail!("expected exactly one successful writer, got {}", succeeded);
    }

    Ok(())
}
