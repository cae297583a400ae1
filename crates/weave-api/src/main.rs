use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weave_api::{
    build_router,
    config::Config,
    state::{AppState, ModeRuntime},
};
use weave_graph::{CredentialBackends, Graph, ThreadLocks};
use weave_input::HumanInputComposer;
use weave_persist::{connect_client, MongoThreadStore, ThreadStore};
use weave_tools::{ToolRegistry, ToolSpec, WebSearchTool};
use weave_types::ChatMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Weave API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // One client, one pool, shared by both modes
    tracing::info!("Connecting to MongoDB");
    let client = connect_client(&config.mongodb_uri, config.mongodb.pool_size, config.mongodb.timeout_ms)
        .await
        .map_err(|e| anyhow::anyhow!("MongoDB is unreachable: {}", e))?;

    let chat_store = MongoThreadStore::from_client(client.clone(), &config.mongodb.database, ChatMode::Chat.namespace());
    let project_store = MongoThreadStore::from_client(client, &config.mongodb.database, ChatMode::Project.namespace());
    chat_store.ensure_indexes().await?;
    project_store.ensure_indexes().await?;
    let chat_store: Arc<dyn ThreadStore> = Arc::new(chat_store);
    let project_store: Arc<dyn ThreadStore> = Arc::new(project_store);

    let backends = Arc::new(CredentialBackends::new(config.credentials.clone()));
    let tools = build_tools(&config)?;

    let chat_graph = Graph::builder()
        .mode(ChatMode::Chat)
        .backends(backends.clone())
        .store(Arc::clone(&chat_store))
        .locks(Arc::new(ThreadLocks::new()))
        .tools(tools)
        .config(config.graph_config())
        .naming_model(config.llm.naming_model)
        .build()?;

    let project_graph = Graph::builder()
        .mode(ChatMode::Project)
        .backends(backends)
        .store(Arc::clone(&project_store))
        .locks(Arc::new(ThreadLocks::new()))
        .config(config.graph_config())
        .naming_model(config.llm.naming_model)
        .build()?;

    let composer = HumanInputComposer::default();
    let state = AppState::new(
        config.clone(),
        ModeRuntime::new(chat_graph, composer.clone(), config.llm.clone()),
        ModeRuntime::new(project_graph, composer, config.llm.clone()),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/openapi.json", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    // Both stores share the client; one shutdown closes the pool
    tracing::info!("Closing MongoDB connections");
    chat_store.shutdown().await?;

    Ok(())
}

/// Web search is bound only when a Tavily key is configured
fn build_tools(config: &Config) -> anyhow::Result<ToolRegistry> {
    let Some(api_key) = &config.tavily_api_key else {
        tracing::warn!("TAVILY_API_KEY not set, chat mode runs without web search");
        return Ok(ToolRegistry::empty());
    };

    let search: Arc<dyn ToolSpec> =
        Arc::new(WebSearchTool::new(api_key)?.with_max_results(config.tools.web_search_max_results));
    Ok(ToolRegistry::new(vec![search]))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
