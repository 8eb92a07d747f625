//! Standard node library
//!
//! Built-in runners for the AI node types plus a couple of utility nodes,
//! and the catalogue describing them.

mod ai;
mod debug;
mod specs;
mod time;

pub use ai::{
    ImageGenerationNode, ImageGenerationNodeFactory, SpeechToTextNode, SpeechToTextNodeFactory,
    TextGenerationNode, TextGenerationNodeFactory, TextToSpeechNode, TextToSpeechNodeFactory,
};
pub use debug::{DebugNode, DebugNodeFactory};
pub use specs::{builtin_specs, spec_for, NodeTypeSpec};
pub use time::{DelayNode, DelayNodeFactory};

use maticore::WorkflowError;
use matiruntime::NodeRegistry;
use std::sync::Arc;

/// Register all standard nodes with a registry
pub fn register_all(registry: &mut NodeRegistry) -> Result<(), WorkflowError> {
    registry.register("text-generation", Arc::new(TextGenerationNodeFactory))?;
    registry.register("speech-to-text", Arc::new(SpeechToTextNodeFactory))?;
    registry.register("text-to-speech", Arc::new(TextToSpeechNodeFactory))?;
    registry.register("image-generation", Arc::new(ImageGenerationNodeFactory))?;
    registry.register("debug.log", Arc::new(DebugNodeFactory))?;
    registry.register("time.delay", Arc::new(DelayNodeFactory))?;
    Ok(())
}

/// A registry holding every standard node.
pub fn builtin_registry() -> Result<NodeRegistry, WorkflowError> {
    let mut registry = NodeRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
