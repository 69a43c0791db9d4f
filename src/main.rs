//src/main.rs

use store_catalog::config::{AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Relatório somente leitura: tags e ranking
    let tags = app_state.aggregation_service.get_tags_list().await?;
    let top_stores = app_state.aggregation_service.get_top_stores().await?;

    let report = serde_json::json!({
        "tags": tags,
        "topStores": top_stores,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
