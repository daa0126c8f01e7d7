use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::macros::datetime;

use sales_ledger::{
    AppState, MokaCacheStore, NewProduct, NewSalesRecord, PaginationConfig, RateLimitConfig,
    create_product, create_sales_record, create_user,
};

/// A utility for creating a test database for the sales ledger REST API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    let state = AppState::new(
        conn,
        "test-secret",
        "Etc/UTC",
        PaginationConfig::default(),
        Arc::new(MokaCacheStore::default()),
        RateLimitConfig::default(),
    )?;

    println!("Creating test user...");
    {
        let connection = state.db_connection.lock().unwrap();
        create_user("apiuser", "apiuserpass", &connection)?;
    }

    println!("Creating test products and sales...");
    let products = [
        ("Laptop", "Electronics", "1200.00"),
        ("Headphones", "Electronics", "150.00"),
        ("Desk Chair", "Furniture", "320.00"),
        ("Notebook", "Stationery", "4.50"),
    ];

    let mut product_ids = Vec::new();
    {
        let connection = state.db_connection.lock().unwrap();
        for (name, category, price) in products {
            let product = create_product(
                NewProduct {
                    name: name.to_owned(),
                    category: category.to_owned(),
                    price: price.parse::<Decimal>()?,
                },
                &connection,
            )?;
            product_ids.push(product.id);
        }
    }

    let sales = [
        (0, 2, "2400.00", datetime!(2024 - 07 - 03 09:15:00 UTC)),
        (1, 5, "750.00", datetime!(2024 - 07 - 21 14:40:00 UTC)),
        (2, 1, "320.00", datetime!(2024 - 08 - 02 11:05:00 UTC)),
        (3, 40, "180.00", datetime!(2024 - 08 - 15 16:30:00 UTC)),
        (0, 1, "1200.00", datetime!(2024 - 09 - 01 00:00:00 UTC)),
        (1, 3, "450.00", datetime!(2024 - 09 - 12 10:00:00 UTC)),
    ];

    for (product_index, quantity_sold, amount, date_of_sale) in sales {
        create_sales_record(
            &state,
            NewSalesRecord {
                product_id: Some(product_ids[product_index]),
                quantity_sold,
                total_sales_amount: amount.parse::<Decimal>()?,
                date_of_sale,
            },
        )?;
    }

    println!("Success!");

    Ok(())
}
