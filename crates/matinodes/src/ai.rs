//! Model-backed nodes
//!
//! No model provider is wired in yet: each runner validates its ports and
//! answers with a fixed placeholder shaped like the real output.

use crate::specs::spec_for;
use async_trait::async_trait;
use maticore::{
    input_str, DataType, NodeConfig, NodeContext, NodeError, NodeRunner, PortSpec, PortValues, Value,
};
use matiruntime::{NodeFactory, NodeMetadata};

fn model_name(config: &NodeConfig) -> &str {
    config.get("model").and_then(Value::as_str).unwrap_or("default")
}

fn metadata_for(node_type: &str) -> NodeMetadata {
    spec_for(node_type).map(NodeMetadata::from).unwrap_or_default()
}

pub(crate) fn text_generation_inputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("prompt", DataType::String).with_description("The prompt text to generate from"),
        PortSpec::new("max_tokens", DataType::Integer)
            .optional()
            .with_default(100i64)
            .with_description("Maximum number of tokens to generate"),
    ]
}

pub(crate) fn text_generation_outputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("text", DataType::String).with_description("The generated text"),
        PortSpec::new("tokens", DataType::Integer).with_description("Number of tokens in generated text"),
    ]
}

/// Generate text from a prompt
pub struct TextGenerationNode;

#[async_trait]
impl NodeRunner for TextGenerationNode {
    fn node_type(&self) -> &str {
        "text-generation"
    }

    fn input_ports(&self) -> Vec<PortSpec> {
        text_generation_inputs()
    }

    fn output_ports(&self) -> Vec<PortSpec> {
        text_generation_outputs()
    }

    async fn execute(
        &self,
        inputs: &PortValues,
        config: &NodeConfig,
        ctx: &NodeContext,
    ) -> Result<PortValues, NodeError> {
        self.validate_inputs(inputs)?;
        let prompt = input_str(inputs, "prompt")?;

        tracing::debug!("Generating text with model {}", model_name(config));
        ctx.events.info(format!("Generating text for {} character prompt", prompt.len()));

        let text = format!("Generated text for prompt: {}", prompt);
        let tokens = text.split_whitespace().count() as i64;

        let outputs = PortValues::from([
            ("text".to_string(), Value::from(text)),
            ("tokens".to_string(), Value::Integer(tokens)),
        ]);
        self.validate_outputs(&outputs)?;
        Ok(outputs)
    }
}

pub struct TextGenerationNodeFactory;

impl NodeFactory for TextGenerationNodeFactory {
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError> {
        Ok(Box::new(TextGenerationNode))
    }

    fn metadata(&self) -> NodeMetadata {
        metadata_for("text-generation")
    }
}

pub(crate) fn speech_to_text_inputs() -> Vec<PortSpec> {
    vec![PortSpec::new("audio", DataType::String).with_description("Base64 encoded audio data")]
}

pub(crate) fn speech_to_text_outputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("text", DataType::String).with_description("The transcribed text"),
        PortSpec::new("confidence", DataType::Number).with_description("Confidence score of transcription"),
    ]
}

/// Transcribe audio to text
pub struct SpeechToTextNode;

#[async_trait]
impl NodeRunner for SpeechToTextNode {
    fn node_type(&self) -> &str {
        "speech-to-text"
    }

    fn input_ports(&self) -> Vec<PortSpec> {
        speech_to_text_inputs()
    }

    fn output_ports(&self) -> Vec<PortSpec> {
        speech_to_text_outputs()
    }

    async fn execute(
        &self,
        inputs: &PortValues,
        config: &NodeConfig,
        _ctx: &NodeContext,
    ) -> Result<PortValues, NodeError> {
        self.validate_inputs(inputs)?;
        let language = config.get("language").and_then(Value::as_str).unwrap_or("en");
        tracing::debug!("Transcribing audio ({}) with model {}", language, model_name(config));

        let outputs = PortValues::from([
            ("text".to_string(), Value::from("Transcribed text would appear here")),
            ("confidence".to_string(), Value::Number(0.95)),
        ]);
        self.validate_outputs(&outputs)?;
        Ok(outputs)
    }
}

pub struct SpeechToTextNodeFactory;

impl NodeFactory for SpeechToTextNodeFactory {
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError> {
        Ok(Box::new(SpeechToTextNode))
    }

    fn metadata(&self) -> NodeMetadata {
        metadata_for("speech-to-text")
    }
}

pub(crate) fn text_to_speech_inputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("text", DataType::String).with_description("Text to convert to speech"),
        PortSpec::new("voice", DataType::String).optional().with_description("Voice ID to use"),
    ]
}

pub(crate) fn text_to_speech_outputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("audio", DataType::String).with_description("Base64 encoded audio data"),
        PortSpec::new("duration", DataType::Number).with_description("Duration of audio in seconds"),
    ]
}

/// Synthesize speech from text
pub struct TextToSpeechNode;

#[async_trait]
impl NodeRunner for TextToSpeechNode {
    fn node_type(&self) -> &str {
        "text-to-speech"
    }

    fn input_ports(&self) -> Vec<PortSpec> {
        text_to_speech_inputs()
    }

    fn output_ports(&self) -> Vec<PortSpec> {
        text_to_speech_outputs()
    }

    async fn execute(
        &self,
        inputs: &PortValues,
        config: &NodeConfig,
        _ctx: &NodeContext,
    ) -> Result<PortValues, NodeError> {
        self.validate_inputs(inputs)?;

        // The port wins over the node config.
        let voice = inputs
            .get("voice")
            .or_else(|| config.get("voice"))
            .and_then(Value::as_str)
            .unwrap_or("default");
        tracing::debug!("Synthesizing speech with voice {}", voice);

        let outputs = PortValues::from([
            ("audio".to_string(), Value::from("base64_encoded_audio_data_would_be_here")),
            ("duration".to_string(), Value::Number(3.5)),
        ]);
        self.validate_outputs(&outputs)?;
        Ok(outputs)
    }
}

pub struct TextToSpeechNodeFactory;

impl NodeFactory for TextToSpeechNodeFactory {
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError> {
        Ok(Box::new(TextToSpeechNode))
    }

    fn metadata(&self) -> NodeMetadata {
        metadata_for("text-to-speech")
    }
}

pub(crate) fn image_generation_inputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("prompt", DataType::String).with_description("Text prompt for image generation"),
        PortSpec::new("style", DataType::String)
            .optional()
            .with_description("Style to apply to the generated image"),
    ]
}

pub(crate) fn image_generation_outputs() -> Vec<PortSpec> {
    vec![
        PortSpec::new("image", DataType::String).with_description("Base64 encoded image data"),
        PortSpec::new("width", DataType::Integer).with_description("Width of generated image"),
        PortSpec::new("height", DataType::Integer).with_description("Height of generated image"),
    ]
}

/// Generate an image from a text description
pub struct ImageGenerationNode;

#[async_trait]
impl NodeRunner for ImageGenerationNode {
    fn node_type(&self) -> &str {
        "image-generation"
    }

    fn input_ports(&self) -> Vec<PortSpec> {
        image_generation_inputs()
    }

    fn output_ports(&self) -> Vec<PortSpec> {
        image_generation_outputs()
    }

    async fn execute(
        &self,
        inputs: &PortValues,
        config: &NodeConfig,
        _ctx: &NodeContext,
    ) -> Result<PortValues, NodeError> {
        self.validate_inputs(inputs)?;
        tracing::debug!("Generating image with model {}", model_name(config));

        let outputs = PortValues::from([
            ("image".to_string(), Value::from("base64_encoded_image_data_would_be_here")),
            ("width".to_string(), Value::Integer(512)),
            ("height".to_string(), Value::Integer(512)),
        ]);
        self.validate_outputs(&outputs)?;
        Ok(outputs)
    }
}

pub struct ImageGenerationNodeFactory;

impl NodeFactory for ImageGenerationNodeFactory {
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError> {
        Ok(Box::new(ImageGenerationNode))
    }

    fn metadata(&self) -> NodeMetadata {
        metadata_for("image-generation")
    }
}
