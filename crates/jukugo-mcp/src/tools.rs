//! MCP tool definitions

use serde::Serialize;

/// MCP tool definition
#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Get all available tools
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "import_level",
            description: "Import compound words for one JLPT level from the dictionary file. Re-running an import is safe.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["level"],
                "properties": {
                    "level": {"type": "string", "enum": ["N5", "N4", "N3", "N2", "N1"], "description": "Level to import"},
                    "dictionaryPath": {"type": "string", "description": "JMdict XML file (default: configured dictionary)"}
                }
            }),
        },
        Tool {
            name: "compounds_for_character",
            description: "List compound words containing a kanji, with its position and the other kanji in each word.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["character"],
                "properties": {
                    "character": {"type": "string", "description": "A single kanji"},
                    "maxLevel": {"type": "string", "enum": ["N5", "N4", "N3", "N2", "N1"], "description": "Only compounds whose kanji are all at or below this level"}
                }
            }),
        },
        Tool {
            name: "validate_compound",
            description: "Check whether a kanji appears at an exact position in a compound word.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["character", "word", "position"],
                "properties": {
                    "character": {"type": "string", "description": "A single kanji"},
                    "word": {"type": "string", "description": "Compound word"},
                    "position": {"type": "integer", "minimum": 0, "description": "Zero-based position of the kanji"}
                }
            }),
        },
        Tool {
            name: "random_character",
            description: "Pick a random kanji at a level plus distractor kanji from the same level.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["level"],
                "properties": {
                    "level": {"type": "string", "enum": ["N5", "N4", "N3", "N2", "N1"]},
                    "distractors": {"type": "integer", "minimum": 0, "maximum": 10, "description": "Number of distractors (default: configured value)"}
                }
            }),
        },
        Tool {
            name: "graph_stats",
            description: "Count characters, words and FORMS edges in the graph.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "wipe_graph",
            description: "Delete every node and edge. Refused unless the server was started with wiping allowed.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["confirm"],
                "properties": {
                    "confirm": {"type": "boolean", "description": "Must be true"}
                }
            }),
        },
    ]
}
