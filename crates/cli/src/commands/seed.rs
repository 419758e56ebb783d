//! Seed the database with a demo store and a small catalog.
//!
//! Intended for local development: creates (or reuses) a store and inserts a
//! few products with descriptions and configurable attributes, enough to
//! exercise carts end to end.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;

/// Errors from the seed command.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

struct DemoProduct {
    sku: &'static str,
    name: &'static str,
    price: Decimal,
    virtual_product: bool,
    attributes: &'static [(&'static str, &'static str, Decimal)],
}

fn demo_products() -> Vec<DemoProduct> {
    vec![
        DemoProduct {
            sku: "SHIRT-CLASSIC",
            name: "Classic Shirt",
            price: dec!(10.00),
            virtual_product: false,
            attributes: const {
                &[
                    ("Size", "M", dec!(0.00)),
                    ("Size", "L", dec!(0.00)),
                    ("Size", "XL", dec!(2.00)),
                ]
            },
        },
        DemoProduct {
            sku: "MUG-LOGO",
            name: "Logo Mug",
            price: dec!(7.50),
            virtual_product: false,
            attributes: &[],
        },
        DemoProduct {
            sku: "GIFTCARD-25",
            name: "Gift Card",
            price: dec!(25.00),
            virtual_product: true,
            attributes: &[],
        },
    ]
}

/// Seed a demo store with products.
///
/// # Errors
///
/// Returns [`SeedError`] if the database URL is missing or an insert fails.
pub async fn run(store_code: &str) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DRIFTWOOD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| SeedError::MissingEnvVar("DRIFTWOOD_DATABASE_URL"))?;

    let pool = PgPool::connect(&database_url).await?;

    let (store_id,) = sqlx::query_as::<_, (i32,)>(
        r"
        INSERT INTO store (code, default_language, currency)
        VALUES ($1, 'en', 'USD')
        ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
        RETURNING id
        ",
    )
    .bind(store_code)
    .fetch_one(&pool)
    .await?;

    tracing::info!(store = store_code, store_id, "Seeding store");

    for product in demo_products() {
        let (product_id,) = sqlx::query_as::<_, (i32,)>(
            r"
            INSERT INTO product (store_id, sku, available, virtual_product, price)
            VALUES ($1, $2, TRUE, $3, $4)
            ON CONFLICT (store_id, sku) DO UPDATE SET price = EXCLUDED.price
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(product.sku)
        .bind(product.virtual_product)
        .bind(product.price)
        .fetch_one(&pool)
        .await?;

        sqlx::query(
            r"
            INSERT INTO product_description (product_id, language, name)
            VALUES ($1, 'en', $2)
            ON CONFLICT (product_id, language) DO UPDATE SET name = EXCLUDED.name
            ",
        )
        .bind(product_id)
        .bind(product.name)
        .execute(&pool)
        .await?;

        // Re-seeding replaces the attribute set instead of stacking duplicates.
        sqlx::query("DELETE FROM product_attribute WHERE product_id = $1")
            .bind(product_id)
            .execute(&pool)
            .await?;

        for (option, value, adjustment) in product.attributes {
            sqlx::query(
                r"
                INSERT INTO product_attribute
                    (product_id, option_id, value_id, option_name, value_name, price_adjustment)
                VALUES ($1, 0, 0, $2, $3, $4)
                ",
            )
            .bind(product_id)
            .bind(option)
            .bind(value)
            .bind(adjustment)
            .execute(&pool)
            .await?;
        }

        tracing::info!(sku = product.sku, "Seeded product");
    }

    tracing::info!("Seed complete!");
    Ok(())
}
