//! Descriptive table of the built-in node types
//!
//! Used for listing and scaffolding. The orchestrator never reads it; runners
//! carry their own port declarations.

use crate::ai;
use maticore::{DataType, PortSpec};
use matiruntime::NodeMetadata;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Catalogue entry for one node type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeSpec {
    /// Registry key, e.g. `text-generation`
    pub node_type: String,
    /// Display name
    pub name: String,
    pub category: String,
    pub description: String,
    pub version: String,
    pub input_ports: Vec<PortSpec>,
    pub output_ports: Vec<PortSpec>,
    /// JSON schema for the node's `config` object
    pub config_schema: serde_json::Value,
}

impl From<NodeTypeSpec> for NodeMetadata {
    fn from(spec: NodeTypeSpec) -> Self {
        NodeMetadata {
            description: spec.description,
            category: spec.category,
            inputs: spec.input_ports,
            outputs: spec.output_ports,
        }
    }
}

/// Every built-in node type, in registration order.
pub fn builtin_specs() -> Vec<NodeTypeSpec> {
    vec![
        NodeTypeSpec {
            node_type: "text-generation".into(),
            name: "Text Generation".into(),
            category: "AI".into(),
            description: "Generate text using language models".into(),
            version: "1.0.0".into(),
            input_ports: ai::text_generation_inputs(),
            output_ports: ai::text_generation_outputs(),
            config_schema: json!({
                "type": "object",
                "properties": {
                    "model": {
                        "type": "string",
                        "enum": ["gpt-3.5-turbo", "gpt-4"],
                        "description": "The model to use for text generation"
                    },
                    "temperature": {
                        "type": "number",
                        "minimum": 0,
                        "maximum": 2,
                        "default": 0.7,
                        "description": "Controls randomness in the output"
                    }
                },
                "required": ["model"]
            }),
        },
        NodeTypeSpec {
            node_type: "speech-to-text".into(),
            name: "Speech to Text".into(),
            category: "AI".into(),
            description: "Convert speech audio to text".into(),
            version: "1.0.0".into(),
            input_ports: ai::speech_to_text_inputs(),
            output_ports: ai::speech_to_text_outputs(),
            config_schema: json!({
                "type": "object",
                "properties": {
                    "language": {
                        "type": "string",
                        "default": "en",
                        "description": "Language code for transcription"
                    },
                    "model": {
                        "type": "string",
                        "enum": ["base", "enhanced"],
                        "default": "base",
                        "description": "Model to use for transcription"
                    }
                }
            }),
        },
        NodeTypeSpec {
            node_type: "text-to-speech".into(),
            name: "Text to Speech".into(),
            category: "AI".into(),
            description: "Convert text to speech audio".into(),
            version: "1.0.0".into(),
            input_ports: ai::text_to_speech_inputs(),
            output_ports: ai::text_to_speech_outputs(),
            config_schema: json!({
                "type": "object",
                "properties": {
                    "voice": {
                        "type": "string",
                        "description": "Voice ID to use"
                    },
                    "speed": {
                        "type": "number",
                        "minimum": 0.5,
                        "maximum": 2.0,
                        "default": 1.0,
                        "description": "Speech speed multiplier"
                    }
                }
            }),
        },
        NodeTypeSpec {
            node_type: "image-generation".into(),
            name: "Image Generation".into(),
            category: "AI".into(),
            description: "Generate images from text descriptions".into(),
            version: "1.0.0".into(),
            input_ports: ai::image_generation_inputs(),
            output_ports: ai::image_generation_outputs(),
            config_schema: json!({
                "type": "object",
                "properties": {
                    "model": {
                        "type": "string",
                        "enum": ["dall-e-2", "dall-e-3", "stable-diffusion"],
                        "description": "Model to use for image generation"
                    },
                    "size": {
                        "type": "string",
                        "enum": ["256x256", "512x512", "1024x1024"],
                        "default": "512x512",
                        "description": "Size of generated image"
                    },
                    "num_images": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 4,
                        "default": 1,
                        "description": "Number of images to generate"
                    }
                },
                "required": ["model"]
            }),
        },
        NodeTypeSpec {
            node_type: "debug.log".into(),
            name: "Debug Log".into(),
            category: "debug".into(),
            description: "Logs input values for debugging".into(),
            version: "1.0.0".into(),
            input_ports: vec![PortSpec::new("message", DataType::String)
                .optional()
                .with_description("Message to log")],
            output_ports: vec![PortSpec::new("message", DataType::String).with_description("The logged message")],
            config_schema: json!({ "type": "object", "properties": {} }),
        },
        NodeTypeSpec {
            node_type: "time.delay".into(),
            name: "Delay".into(),
            category: "time".into(),
            description: "Delay execution for specified milliseconds".into(),
            version: "1.0.0".into(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            config_schema: json!({
                "type": "object",
                "properties": {
                    "delay_ms": {
                        "type": "integer",
                        "minimum": 0,
                        "default": 1000,
                        "description": "How long to wait before passing inputs through"
                    }
                }
            }),
        },
    ]
}

/// Look up one entry of [`builtin_specs`].
pub fn spec_for(node_type: &str) -> Option<NodeTypeSpec> {
    builtin_specs().into_iter().find(|spec| spec.node_type == node_type)
}
