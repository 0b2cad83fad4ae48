use intranet_rbac::config::{init_tracing, load_env, AppConfig};
use intranet_rbac::{db, docs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let config = AppConfig::from_env()?;
    let pool = db::init(&config.database_url).await?;
    let app = intranet_rbac::create_app(pool).await?;

    let openapi = docs::build_openapi(config.port)?;
    let app = app.merge(docs::swagger_routes(openapi)?);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
