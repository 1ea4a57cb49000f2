//! MCP request handlers

use std::path::PathBuf;
use std::sync::Arc;

use jukugo_core::Level;
use jukugo_service::{GraphQueries, ImportRequest, Importer, LevelSource, ServiceError};
use jukugo_storage::GraphStore;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// MCP tool call request
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// MCP tool call response
#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "isError")]
    pub is_error: Option<bool>,
}

/// Content block for responses
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    pub fn json<T: Serialize>(data: &T) -> Self {
        match serde_json::to_string_pretty(data) {
            Ok(json) => Self::text(json),
            Err(e) => Self::error(format!("JSON serialization error: {}", e)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

impl From<ServiceError> for ToolCallResponse {
    fn from(e: ServiceError) -> Self {
        Self::error(e.to_string())
    }
}

/// Server-wide settings the tools consult
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Dictionary used when `import_level` is called without a path
    pub dictionary: Option<PathBuf>,
    /// Whether `wipe_graph` may run
    pub allow_wipe: bool,
    /// Distractor count when `random_character` is called without one
    pub distractors: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            dictionary: None,
            allow_wipe: false,
            distractors: 3,
        }
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: serde_json::Value) -> Result<T, ToolCallResponse> {
    // Tools with no required arguments may be called with no arguments object
    let args = if args.is_null() {
        serde_json::json!({})
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| ToolCallResponse::error(format!("Invalid arguments: {}", e)))
}

fn parse_level(level: &str) -> Result<Level, ToolCallResponse> {
    level
        .parse()
        .map_err(|e: jukugo_core::Error| ToolCallResponse::error(e.to_string()))
}

/// Tool handler that processes tool calls
pub struct ToolHandler<S: GraphStore + ?Sized> {
    queries: GraphQueries<S>,
    importer: Importer<S>,
    levels: Arc<dyn LevelSource>,
    settings: ServerSettings,
    shutdown: CancellationToken,
}

impl<S: GraphStore + ?Sized + 'static> ToolHandler<S> {
    pub fn new(store: Arc<S>, levels: Arc<dyn LevelSource>, settings: ServerSettings) -> Self {
        Self {
            queries: GraphQueries::new(Arc::clone(&store)),
            importer: Importer::new(store),
            levels,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn queries(&self) -> &GraphQueries<S> {
        &self.queries
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Cancel in-flight imports; their transactions roll back
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn handle(&self, request: ToolCallRequest) -> ToolCallResponse {
        tracing::debug!("Handling tool call: {}", request.name);

        let result = match request.name.as_str() {
            "import_level" => self.import_level(request.arguments).await,
            "compounds_for_character" => self.compounds_for_character(request.arguments).await,
            "validate_compound" => self.validate_compound(request.arguments).await,
            "random_character" => self.random_character(request.arguments).await,
            "graph_stats" => self.graph_stats().await,
            "wipe_graph" => self.wipe_graph(request.arguments).await,
            _ => Err(ToolCallResponse::error(format!(
                "Unknown tool: {}",
                request.name
            ))),
        };

        result.unwrap_or_else(|e| e)
    }

    async fn import_level(&self, args: serde_json::Value) -> Result<ToolCallResponse, ToolCallResponse> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ImportArgs {
            level: String,
            dictionary_path: Option<PathBuf>,
        }

        let args: ImportArgs = parse_args(args)?;
        let level = parse_level(&args.level)?;
        let dictionary = args
            .dictionary_path
            .or_else(|| self.settings.dictionary.clone())
            .ok_or_else(|| {
                ToolCallResponse::error("No dictionary path given and none configured")
            })?;

        let report = self
            .importer
            .import_level(
                ImportRequest::new(level, dictionary),
                self.levels.as_ref(),
                self.shutdown.child_token(),
            )
            .await?;
        Ok(ToolCallResponse::json(&report))
    }

    async fn compounds_for_character(
        &self,
        args: serde_json::Value,
    ) -> Result<ToolCallResponse, ToolCallResponse> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CompoundsArgs {
            character: String,
            max_level: Option<String>,
        }

        let args: CompoundsArgs = parse_args(args)?;
        let entries = match args.max_level {
            Some(level) => {
                let level = parse_level(&level)?;
                self.queries
                    .compounds_at_level(&args.character, level)
                    .await?
            }
            None => self.queries.compounds_for_character(&args.character).await?,
        };
        Ok(ToolCallResponse::json(&entries))
    }

    async fn validate_compound(
        &self,
        args: serde_json::Value,
    ) -> Result<ToolCallResponse, ToolCallResponse> {
        #[derive(Deserialize)]
        struct ValidateArgs {
            character: String,
            word: String,
            position: u32,
        }

        let args: ValidateArgs = parse_args(args)?;
        let validation = self
            .queries
            .validate_compound(&args.character, &args.word, args.position)
            .await?;
        Ok(ToolCallResponse::json(&validation))
    }

    async fn random_character(
        &self,
        args: serde_json::Value,
    ) -> Result<ToolCallResponse, ToolCallResponse> {
        #[derive(Deserialize)]
        struct RandomArgs {
            level: String,
            distractors: Option<usize>,
        }

        let args: RandomArgs = parse_args(args)?;
        let level = parse_level(&args.level)?;
        let count = args.distractors.unwrap_or(self.settings.distractors);

        match self.queries.random_challenge(level, count).await? {
            Some(challenge) => Ok(ToolCallResponse::json(&challenge)),
            None => Ok(ToolCallResponse::error(format!(
                "No characters imported at level {}",
                level
            ))),
        }
    }

    async fn graph_stats(&self) -> Result<ToolCallResponse, ToolCallResponse> {
        let stats = self.queries.stats().await?;
        Ok(ToolCallResponse::json(&stats))
    }

    async fn wipe_graph(&self, args: serde_json::Value) -> Result<ToolCallResponse, ToolCallResponse> {
        #[derive(Deserialize)]
        struct WipeArgs {
            #[serde(default)]
            confirm: bool,
        }

        if !self.settings.allow_wipe {
            return Err(ToolCallResponse::error(
                "Wiping is disabled. Set allow_wipe = true in the config to enable it.",
            ));
        }

        let args: WipeArgs = parse_args(args)?;
        if !args.confirm {
            return Err(ToolCallResponse::error("Refusing to wipe without confirm: true"));
        }

        self.queries.wipe().await?;
        Ok(ToolCallResponse::text("Graph wiped"))
    }
}
