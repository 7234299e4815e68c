//! # Seed Data Generator
//!
//! Populates the database with test coupons for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 coupons (default)
//! cargo run -p bazaar-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p bazaar-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p bazaar-db --bin seed -- --db ./data/bazaar.db
//! ```
//!
//! ## Generated Coupons
//! Creates a realistic spread across the states the checkout path handles:
//! - Percentage and fixed discounts
//! - Capped (max_discount) and uncapped
//! - Live, not-yet-started, expired, and retired windows
//! - Limited, per-customer-limited, and unlimited usage
//! - With and without minimum purchase requirements

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use bazaar_core::coupon::is_valid;
use bazaar_core::{Coupon, CouponType};
use bazaar_db::{Database, DbConfig};

/// Campaign words used to build readable codes
const CAMPAIGNS: &[&str] = &[
    "SUMMER", "WINTER", "SPRING", "FALL", "LAUNCH", "FLASH", "WEEKEND", "LOYAL", "WELCOME",
    "COMEBACK", "BUNDLE", "CLEARANCE",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./bazaar_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of coupons to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bazaar Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Coupons:  {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing coupons
    let existing = db.coupons().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} coupons", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating coupons...");

    let mut generated = 0;
    let mut live = 0;
    let start = std::time::Instant::now();
    let now = Utc::now();

    for seed in 0..count {
        let coupon = generate_coupon(seed);
        if is_valid(&coupon, now) {
            live += 1;
        }

        if let Err(e) = db.coupons().insert(&coupon).await {
            eprintln!("Failed to insert {}: {}", coupon.code, e);
            continue;
        }

        generated += 1;

        if generated % 50 == 0 {
            println!("  Generated {} coupons...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} coupons in {:?}", generated, elapsed);
    println!("  Currently redeemable: {}", live);

    // Verify lookup path
    println!();
    println!("Verifying lookup...");
    let sample = generate_coupon(0);
    match db.coupons().find_by_code(&sample.code).await? {
        Some(found) => {
            println!("  Lookup '{}': found ({:?})", found.code, found.coupon_type);
            println!("  Storefront payload:");
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        None => println!("  Lookup '{}': NOT FOUND", sample.code),
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single coupon with a deterministic mix of states.
fn generate_coupon(seed: usize) -> Coupon {
    let now = Utc::now();

    let campaign = CAMPAIGNS[seed % CAMPAIGNS.len()];

    // Alternate percentage / fixed
    let (coupon_type, value, code) = if seed % 2 == 0 {
        let pct = [5, 10, 15, 20, 25, 50][seed % 6];
        (
            CouponType::Percentage,
            (pct * 100) as i64, // percent → basis points
            format!("{}{}-{:03}", campaign, pct, seed),
        )
    } else {
        let cents = [500, 1_000, 2_500, 5_000][seed % 4] as i64;
        (
            CouponType::Fixed,
            cents,
            format!("{}-{}-{:03}", campaign, cents / 100, seed),
        )
    };

    // Window mix: most live, some expired, some future
    let (start_date, end_date) = match seed % 7 {
        0 => (now - Duration::days(60), Some(now - Duration::days(10))), // expired
        1 => (now + Duration::days(7), Some(now + Duration::days(30))),  // future
        2 => (now - Duration::days(10), None),                           // open-ended
        _ => (now - Duration::days(10), Some(now + Duration::days(20))), // live
    };

    Coupon {
        id: Uuid::new_v4().to_string(),
        merchant_id: format!("merchant-{:02}", seed % 10),
        code,
        coupon_type,
        value,
        min_purchase_cents: if seed % 4 == 0 {
            Some(((seed % 5 + 1) * 5_000) as i64)
        } else {
            None
        },
        max_discount_cents: if coupon_type == CouponType::Percentage && seed % 3 == 0 {
            Some(((seed % 4 + 1) * 2_500) as i64)
        } else {
            None
        },
        usage_limit: if seed % 5 == 0 {
            Some(((seed % 10 + 1) * 10) as i64)
        } else {
            None
        },
        used_count: 0,
        per_customer_limit: if seed % 6 == 0 { Some(1) } else { None },
        start_date,
        end_date,
        is_active: seed % 11 != 0, // a few retired
        created_at: now,
        updated_at: now,
    }
}
