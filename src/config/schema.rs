use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "sandbox": {
                "type": "object",
                "properties": {
                    "root": { "type": "string" },
                    "prefix": { "type": "string", "minLength": 1 },
                    "keep": { "type": "boolean" },
                    "excluded_dirs": { "type": "array", "items": { "type": "string" } }
                }
            },
            "limits": {
                "type": "object",
                "properties": {
                    "install_timeout_secs": { "$ref": "#/$defs/seconds" },
                    "syntax_timeout_secs": { "$ref": "#/$defs/seconds" },
                    "startup_timeout_secs": { "$ref": "#/$defs/seconds" },
                    "scan_timeout_secs": { "$ref": "#/$defs/seconds" },
                    "install_error_chars": { "type": "integer", "minimum": 0 },
                    "syntax_error_chars": { "type": "integer", "minimum": 0 },
                    "startup_error_chars": { "type": "integer", "minimum": 0 },
                    "max_syntax_samples": { "type": "integer", "minimum": 0 },
                    "max_endpoint_samples": { "type": "integer", "minimum": 0 },
                    "max_python_entry_points": { "type": "integer", "minimum": 0 }
                }
            },
            "tools": {
                "type": "object",
                "properties": {
                    "python": { "type": "string", "minLength": 1 },
                    "node": { "type": "string", "minLength": 1 },
                    "npm": { "type": "string", "minLength": 1 },
                    "scanner": { "type": "array", "minItems": 1, "items": { "type": "string" } }
                }
            },
            "publish": {
                "type": "object",
                "properties": {
                    "agent_type": { "type": "string", "minLength": 1 },
                    "backend": { "type": "string", "enum": ["local", "http"] },
                    "directory": { "type": "string" },
                    "endpoint": { "type": "string", "format": "uri" },
                    "bucket": { "type": "string", "minLength": 1 },
                    "token_env": { "type": "string" },
                    "timeout_secs": { "$ref": "#/$defs/seconds" },
                    "max_retries": { "type": "integer", "minimum": 0 }
                }
            },
            "verdict": {
                "type": "object",
                "properties": {
                    "legacy_token_match": { "type": "boolean" }
                }
            }
        },
        "$defs": {
            "seconds": { "type": "integer", "minimum": 1 }
        }
    })
});
