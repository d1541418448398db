pub mod auth;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod uploads;

use std::path::PathBuf;

use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Shared server configuration handed to handlers via app data.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upload_dir: PathBuf,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::cart::add_products,
        handlers::cart::apply_coupon,
        handlers::cart::remove_product,
        handlers::orders::create_order,
        handlers::orders::get_my_orders,
        handlers::orders::get_order,
        handlers::orders::pay_order,
        handlers::orders::deliver_order,
        handlers::orders::get_all_orders,
        handlers::products::create_product,
        handlers::products::get_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::create_review,
        handlers::products::top_products,
    ),
    tags(
        (name = "cart", description = "Shopping cart"),
        (name = "orders", description = "Order placement and fulfillment"),
        (name = "products", description = "Product catalog"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server. Uploaded product images are written to `upload_dir` and
/// served back under `/uploads`.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
    upload_dir: PathBuf,
) -> std::io::Result<actix_web::dev::Server> {
    std::fs::create_dir_all(&upload_dir)?;

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(AppConfig {
                upload_dir: upload_dir.clone(),
            }))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/api/v1/cart")
                    .route("/add-product", web::post().to(handlers::cart::add_products))
                    .route("/apply-coupon", web::post().to(handlers::cart::apply_coupon))
                    .route(
                        "/remove/{productId}",
                        web::delete().to(handlers::cart::remove_product),
                    ),
            )
            .service(
                web::scope("/api/v1/orders")
                    .route(
                        "/addOrderItems",
                        web::post().to(handlers::orders::create_order),
                    )
                    .route("/myorders", web::get().to(handlers::orders::get_my_orders))
                    .route("/{id}/pay", web::put().to(handlers::orders::pay_order))
                    .route(
                        "/{id}/deliver",
                        web::put().to(handlers::orders::deliver_order),
                    )
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("", web::get().to(handlers::orders::get_all_orders)),
            )
            .service(
                web::scope("/api/v1/products")
                    .route(
                        "/create-product",
                        web::post().to(handlers::products::create_product),
                    )
                    .route(
                        "/get-all-products",
                        web::get().to(handlers::products::get_products),
                    )
                    .route(
                        "/get-product/{id}",
                        web::get().to(handlers::products::get_product),
                    )
                    .route(
                        "/update-product/{id}",
                        web::put().to(handlers::products::update_product),
                    )
                    .route(
                        "/delete-product/{id}",
                        web::delete().to(handlers::products::delete_product),
                    )
                    .route(
                        "/top-ten-products",
                        web::get().to(handlers::products::top_products),
                    )
                    .route(
                        "/{id}/review",
                        web::post().to(handlers::products::create_review),
                    ),
            )
            .service(Files::new("/uploads", upload_dir.clone()))
    })
    .bind((host.to_string(), port))?
    .run())
}
