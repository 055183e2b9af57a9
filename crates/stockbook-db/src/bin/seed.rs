//! # Seed Data Generator
//!
//! Populates a development database with one business's catalog and
//! contacts.
//!
//! ## Usage
//! ```bash
//! # Seed the default business into ./stockbook_dev.db
//! cargo run -p stockbook-db --bin seed
//!
//! # Pick the business id and database path
//! cargo run -p stockbook-db --bin seed -- --business 9b2f... --db ./data/stockbook.db
//! ```
//!
//! ## Generated Data
//! - Products across a few categories, some deliberately at or below
//!   their minimum stock level so the low-stock report has content
//! - Customers and vendors with distinct phone numbers
//!
//! Paste the printed business id into a token's `business_id` claim to
//! post against the seeded data.

use chrono::Utc;
use std::env;
use stockbook_core::{Contact, ContactType, Product};
use stockbook_db::repository::contact::generate_contact_id;
use stockbook_db::repository::product::generate_product_id;
use stockbook_db::{Database, DbConfig};
use uuid::Uuid;

/// (category, name, sku prefix, price in cents)
const PRODUCTS: &[(&str, &str, &str, i64)] = &[
    ("Grocery", "Basmati Rice 5kg", "GRO-RICE", 185_00),
    ("Grocery", "Sugar 1kg", "GRO-SUGR", 16_50),
    ("Grocery", "Cooking Oil 1L", "GRO-OIL", 52_00),
    ("Grocery", "Red Lentils 1kg", "GRO-DAL", 38_75),
    ("Beverages", "Green Tea 100g", "BEV-TEA", 12_99),
    ("Beverages", "Mineral Water 1.5L", "BEV-WTR", 1_20),
    ("Household", "Dish Soap 500ml", "HSH-SOAP", 4_49),
    ("Household", "Laundry Powder 2kg", "HSH-LDRY", 21_00),
    ("Stationery", "A4 Paper Ream", "STA-A4", 9_99),
    ("Stationery", "Ballpoint Pens (10)", "STA-PEN", 3_25),
];

/// (name, phone, type)
const CONTACTS: &[(&str, &str, ContactType)] = &[
    ("Ayesha Khan", "0300-1110001", ContactType::Customer),
    ("Bilal Ahmed", "0300-1110002", ContactType::Customer),
    ("Corner Cafe", "0300-1110003", ContactType::Customer),
    ("Metro Wholesale", "0300-2220001", ContactType::Vendor),
    ("Sunrise Distributors", "0300-2220002", ContactType::Vendor),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockbook_dev.db");
    let mut business_id = Uuid::new_v4().to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--business" | "-b" => {
                if i + 1 < args.len() {
                    business_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./stockbook_dev.db)");
                println!("  -b, --business <ID>    Business id to seed (default: random UUID)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockbook Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Business: {}", business_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count(&business_id).await?;
    if existing > 0 {
        println!("⚠ Business already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let now = Utc::now();

    let mut inserted = 0;
    for (index, (category, name, sku, price_cents)) in PRODUCTS.iter().enumerate() {
        // Every third product starts at its reorder level.
        let min_stock_level = 5;
        let stock = if index % 3 == 0 { min_stock_level } else { 20 + (index as i64 * 7) % 60 };

        let product = Product {
            id: generate_product_id(),
            business_id: business_id.clone(),
            name: name.to_string(),
            description: None,
            sku: Some(sku.to_string()),
            category: category.to_string(),
            price_cents: *price_cents,
            stock,
            min_stock_level,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        match db.products().insert(&product).await {
            Ok(()) => {
                inserted += 1;
                println!("  product  {}  {:<24} stock {:>3}", product.id, product.name, product.stock);
            }
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }

    for (name, phone, contact_type) in CONTACTS {
        let contact = Contact {
            id: generate_contact_id(),
            business_id: business_id.clone(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            contact_type: *contact_type,
            credit_limit_cents: 50_000_00,
            current_balance_cents: 0,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        match db.contacts().insert(&contact).await {
            Ok(()) => println!("  {:<8} {}  {}", contact.contact_type.as_str(), contact.id, contact.name),
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }

    println!();
    println!(
        "✓ Seeded {} products and {} contacts",
        inserted,
        db.contacts().count(&business_id).await?
    );
    println!(
        "  Low stock: {}",
        db.products().list_low_stock(&business_id).await?.len()
    );

    Ok(())
}
