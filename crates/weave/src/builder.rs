use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use weave_graph::{BackendProvider, CredentialBackends, Graph};
use weave_input::{Attachment, HumanInputComposer};
use weave_llm::{ModelId, ProviderCredentials};
use weave_persist::{InMemoryThreadStore, ThreadStore};
use weave_tools::{ToolRegistry, ToolSpec, WebSearchTool};
use weave_types::{ChatMode, Delivery, GraphConfig, LLMConfig, TurnEvent, TurnInput, TurnOutcome};

enum StoreChoice {
    Memory,
    #[cfg(feature = "mongodb")]
    Mongo { uri: String, database: String },
    Custom(Arc<dyn ThreadStore>),
}

/// Builder for an [`Agent`]
///
/// Defaults: chat mode, `gpt-4o-mini`, in-memory threads, no tools.
///
/// # Example
/// ```rust,no_run
/// # use weave::prelude::*;
/// # async fn example() -> anyhow::Result<()> {
/// let agent = AgentBuilder::new()
///     .anthropic_key("sk-ant-...")
///     .model(ModelId::ClaudeSonnet45)
///     .temperature(0.2)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AgentBuilder {
    mode: ChatMode,
    credentials: ProviderCredentials,
    backends: Option<Arc<dyn BackendProvider>>,
    model: ModelId,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    graph_config: GraphConfig,
    store: StoreChoice,
    tavily_api_key: Option<String>,
    tools: Vec<Arc<dyn ToolSpec>>,
    naming_model: Option<ModelId>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            mode: ChatMode::Chat,
            credentials: ProviderCredentials::default(),
            backends: None,
            model: ModelId::default(),
            temperature: None,
            max_tokens: None,
            graph_config: GraphConfig::default(),
            store: StoreChoice::Memory,
            tavily_api_key: None,
            tools: Vec::new(),
            naming_model: Some(ModelId::Gpt35Turbo),
        }
    }

    /// Chat (default) or project mode
    pub fn mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    /// Read provider keys from `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` and `DEEPSEEK_API_KEY`
    pub fn credentials_from_env(mut self) -> Self {
        self.credentials = ProviderCredentials::from_env();
        self
    }

    pub fn credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn openai_key(mut self, key: impl Into<String>) -> Self {
        self.credentials.openai_api_key = Some(key.into());
        self
    }

    pub fn anthropic_key(mut self, key: impl Into<String>) -> Self {
        self.credentials.anthropic_api_key = Some(key.into());
        self
    }

    pub fn deepseek_key(mut self, key: impl Into<String>) -> Self {
        self.credentials.deepseek_api_key = Some(key.into());
        self
    }

    /// Replace credential-based backend resolution entirely
    pub fn backends(mut self, backends: Arc<dyn BackendProvider>) -> Self {
        self.backends = Some(backends);
        self
    }

    /// Model used for every turn (default: gpt-4o-mini)
    pub fn model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn graph_config(mut self, config: GraphConfig) -> Self {
        self.graph_config = config;
        self
    }

    /// Model used to title new threads; `None` keeps the user's first words
    pub fn naming_model(mut self, model: Option<ModelId>) -> Self {
        self.naming_model = model;
        self
    }

    /// Persist threads in MongoDB instead of memory
    #[cfg(feature = "mongodb")]
    pub fn mongodb(mut self, uri: impl Into<String>, database: impl Into<String>) -> Self {
        self.store = StoreChoice::Mongo {
            uri: uri.into(),
            database: database.into(),
        };
        self
    }

    pub fn store(mut self, store: Arc<dyn ThreadStore>) -> Self {
        self.store = StoreChoice::Custom(store);
        self
    }

    /// Bind the Tavily web search tool (chat mode only)
    pub fn tavily_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    pub fn tool(mut self, tool: Arc<dyn ToolSpec>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Build the agent
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the web search tool can't be created
    /// - MongoDB is unreachable or its indexes can't be created
    /// - the graph rejects its configuration
    pub async fn build(self) -> Result<Agent> {
        let mut tools = self.tools;
        if let Some(key) = &self.tavily_api_key {
            let search = WebSearchTool::new(key).context("Failed to create web search tool")?;
            tools.push(Arc::new(search));
        }

        let store: Arc<dyn ThreadStore> = match self.store {
            StoreChoice::Memory => Arc::new(InMemoryThreadStore::new()),
            #[cfg(feature = "mongodb")]
            StoreChoice::Mongo { uri, database } => {
                let store = weave_persist::MongoThreadStore::connect(
                    &uri,
                    &database,
                    self.mode.namespace(),
                    10,
                    5_000,
                )
                .await
                .context("Failed to connect to MongoDB")?;
                Arc::new(store)
            }
            StoreChoice::Custom(store) => store,
        };

        let backends: Arc<dyn BackendProvider> = match self.backends {
            Some(backends) => backends,
            None => Arc::new(CredentialBackends::new(self.credentials)),
        };

        let graph = Graph::builder()
            .mode(self.mode)
            .backends(backends)
            .store(store)
            .tools(ToolRegistry::new(tools))
            .config(self.graph_config)
            .naming_model(self.naming_model)
            .build()
            .context("Failed to build conversation graph")?;

        let mut llm_config = LLMConfig::new(self.model);
        llm_config.temperature = self.temperature;
        llm_config.max_tokens = self.max_tokens;

        Ok(Agent {
            graph,
            composer: HumanInputComposer::default(),
            llm_config,
        })
    }
}

/// A configured conversation graph with its message composer
#[derive(Clone)]
pub struct Agent {
    graph: Graph,
    composer: HumanInputComposer,
    llm_config: LLMConfig,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Start a new thread and wait for the complete reply
    ///
    /// # Example
    /// ```rust,no_run
    /// # use weave::prelude::*;
    /// # async fn example(agent: Agent) -> Result<()> {
    /// let reply = agent.chat("What is 2+2?").await?;
    /// println!("{} says {}", reply.thread_id, reply.message.content().to_plain_text());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn chat(&self, message: impl AsRef<str>) -> Result<TurnOutcome> {
        self.send(None, message.as_ref(), &[]).await
    }

    pub async fn chat_in_thread(&self, thread_id: &str, message: impl AsRef<str>) -> Result<TurnOutcome> {
        self.send(Some(thread_id), message.as_ref(), &[]).await
    }

    /// Send text plus files; unsupported files are skipped
    pub async fn chat_with_files(
        &self,
        thread_id: Option<&str>,
        message: impl AsRef<str>,
        attachments: &[Attachment],
    ) -> Result<TurnOutcome> {
        self.send(thread_id, message.as_ref(), attachments).await
    }

    /// Stream the turn's events; failures arrive as a final [`TurnEvent::Error`]
    pub async fn chat_stream(&self, thread_id: Option<&str>, message: impl AsRef<str>) -> ReceiverStream<TurnEvent> {
        let input = self.input(thread_id, message.as_ref(), &[], Delivery::Stream).await;
        ReceiverStream::new(self.graph.spawn_run(input))
    }

    async fn send(&self, thread_id: Option<&str>, message: &str, attachments: &[Attachment]) -> Result<TurnOutcome> {
        let input = self.input(thread_id, message, attachments, Delivery::Complete).await;
        Ok(self.graph.run(input).await?)
    }

    async fn input(
        &self,
        thread_id: Option<&str>,
        message: &str,
        attachments: &[Attachment],
        delivery: Delivery,
    ) -> TurnInput {
        let message = self.composer.compose(message, attachments).await;
        let input = TurnInput::new(message, self.llm_config.clone(), delivery);
        match thread_id {
            Some(thread_id) => input.with_thread(thread_id),
            None => input,
        }
    }

    /// The underlying graph, for advanced usage
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn store(&self) -> &Arc<dyn ThreadStore> {
        self.graph.store()
    }
}
