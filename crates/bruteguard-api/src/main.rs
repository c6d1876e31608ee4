use actix_web::{web, App, HttpResponse, HttpServer};
use tracing::info;

use bruteguard_api::bucket::{BucketStore, RateLimiter};
use bruteguard_api::config::Config;
use bruteguard_api::list_store::ListStore;
use bruteguard_api::{middleware, routes};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(distribute)]
    {
        fmt().json().with_env_filter(filter).init();
    }

    #[cfg(not(distribute))]
    {
        fmt().pretty().with_env_filter(filter).init();
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().expect("failed to load configuration");
    info!(addr = %config.bind_addr, "starting bruteguard-api");

    let store = BucketStore::connect(&config.redis_addr, config.redis_pool_size)
        .await
        .expect("failed to connect to bucket store");

    let rate_limiter = RateLimiter::new(
        store,
        config.key_ttl,
        config.login_bucket,
        config.pass_bucket,
        config.ip_bucket,
    );

    let list_store = ListStore::new();
    let bind = config.bind_addr.clone();

    let list_store_data = web::Data::new(list_store);
    let rate_limiter_data = web::Data::new(rate_limiter);
    let config_data = web::Data::new(config);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(list_store_data.clone())
            .app_data(rate_limiter_data.clone())
            .app_data(config_data.clone())
            .wrap(middleware::AccessLog)
            .route("/health", web::get().to(health))
            .configure(routes::configure)
    })
    .bind(&bind)?
    .run();

    info!("listening");
    let result = server.await;
    info!("connection pool closed after drain");
    result
}
