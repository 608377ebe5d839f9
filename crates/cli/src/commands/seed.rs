//! Development data seeding.
//!
//! Creates a demo seller and buyer, a small category tree, and a handful
//! of products with stock. Safe to re-run: existing users and categories
//! are reused, duplicate products are skipped by name.

use threadcart_core::SizeStock;

use threadcart_api::db::products::NewProduct;
use threadcart_api::db::{CategoryRepository, ProductRepository, UserRepository};
use threadcart_api::services::auth::{AuthError, AuthService};

use super::CliError;

const SELLER_EMAIL: &str = "seller@threadcart.dev";
const BUYER_EMAIL: &str = "buyer@threadcart.dev";
const PASSWORD: &str = "threadcart-dev";

/// Seed the database with development data.
///
/// # Errors
///
/// Returns `CliError` if any insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);
    let auth = AuthService::new(&pool);

    let seller_id = match auth
        .signup("Demo Seller", SELLER_EMAIL, "9900000001", PASSWORD)
        .await
    {
        Ok(user) => user.id,
        Err(AuthError::EmailTaken | AuthError::PhoneTaken) => {
            let (user, _) = users
                .get_with_password_hash(SELLER_EMAIL)
                .await?
                .ok_or(threadcart_api::db::RepositoryError::NotFound)?;
            user.id
        }
        Err(other) => return Err(other.into()),
    };
    users.set_seller(seller_id).await.ok();

    match auth
        .signup("Demo Buyer", BUYER_EMAIL, "9900000002", PASSWORD)
        .await
    {
        Ok(_) | Err(AuthError::EmailTaken | AuthError::PhoneTaken) => {}
        Err(other) => return Err(other.into()),
    }

    let categories = CategoryRepository::new(&pool);
    let shirts = categories
        .create_path(&["men".to_owned(), "topwear".to_owned(), "shirts".to_owned()])
        .await?;
    let kurtas = categories
        .create_path(&["women".to_owned(), "ethnic".to_owned(), "kurtas".to_owned()])
        .await?;

    let products = ProductRepository::new(&pool);
    let demo = [
        NewProduct {
            brand: "Loomcraft".to_owned(),
            name: "Oxford shirt".to_owned(),
            price: 1499,
            discount_percent: 10,
            sizes: vec![
                SizeStock { label: "S".to_owned(), quantity: 10 },
                SizeStock { label: "M".to_owned(), quantity: 10 },
                SizeStock { label: "L".to_owned(), quantity: 5 },
            ],
            tags: vec!["shirt".to_owned(), "cotton".to_owned()],
            description: threadcart_core::ProductDescription {
                about: "Slim-fit cotton oxford shirt.".to_owned(),
                manufactured: "Loomcraft Apparel, Tiruppur".to_owned(),
                packed: "Loomcraft Apparel, Tiruppur".to_owned(),
            },
            image_urls: Vec::new(),
            category_id: shirts,
            categories: vec!["men".to_owned(), "topwear".to_owned(), "shirts".to_owned()],
        },
        NewProduct {
            brand: "Anvi".to_owned(),
            name: "Printed kurta".to_owned(),
            price: 999,
            discount_percent: 20,
            sizes: vec![
                SizeStock { label: "M".to_owned(), quantity: 8 },
                SizeStock { label: "XL".to_owned(), quantity: 2 },
            ],
            tags: vec!["kurta".to_owned()],
            description: threadcart_core::ProductDescription {
                about: "Block-printed straight kurta.".to_owned(),
                manufactured: "Anvi Textiles, Jaipur".to_owned(),
                packed: "Anvi Textiles, Jaipur".to_owned(),
            },
            image_urls: Vec::new(),
            category_id: kurtas,
            categories: vec!["women".to_owned(), "ethnic".to_owned(), "kurtas".to_owned()],
        },
    ];

    let existing = products.list_by_seller(seller_id, None).await?;
    for new in demo {
        if existing.iter().any(|p| p.name == new.name) {
            continue;
        }
        let product = products.create(seller_id, &new).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "seeded product");
    }

    tracing::info!("Seed complete");
    Ok(())
}
