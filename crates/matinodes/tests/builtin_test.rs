use maticore::{
    DataType, EventBus, ExecutionEvent, NodeConfig, NodeContext, NodeError, NodeRunner, NodeSpec,
    NodeStatus, PortDirection, PortSpec, PortValues, RunStatus, Value, Workflow,
};
use matinodes::{
    builtin_registry, DebugNode, DelayNode, ImageGenerationNode, SpeechToTextNode,
    TextGenerationNode, TextToSpeechNode,
};
use matiruntime::{FlowRuntime, InMemoryRunStore, RuntimeConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

// Helper function to create a test context
fn create_test_context(bus: &EventBus) -> NodeContext {
    let run_id = uuid::Uuid::new_v4();
    NodeContext::new(
        run_id,
        "node",
        bus.create_emitter(run_id, "node"),
        CancellationToken::new(),
    )
}

fn inputs(pairs: &[(&str, Value)]) -> PortValues {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[tokio::test]
async fn test_text_generation_echoes_prompt() {
    let bus = EventBus::new(16);
    let ctx = create_test_context(&bus);

    let outputs = TextGenerationNode
        .execute(&inputs(&[("prompt", Value::from("Hello"))]), &NodeConfig::new(), &ctx)
        .await
        .unwrap();

    assert_eq!(outputs["text"], Value::from("Generated text for prompt: Hello"));
    assert_eq!(outputs["tokens"], Value::Integer(5));
}

#[tokio::test]
async fn test_text_generation_requires_prompt() {
    let bus = EventBus::new(16);
    let ctx = create_test_context(&bus);

    let err = TextGenerationNode
        .execute(&PortValues::new(), &NodeConfig::new(), &ctx)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        NodeError::MissingPort {
            port: "prompt".into(),
            direction: PortDirection::Input
        }
    );

    let err = TextGenerationNode
        .execute(
            &inputs(&[("prompt", Value::from("x")), ("max_tokens", Value::Number(1.5))]),
            &NodeConfig::new(),
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidType { ref port, .. } if port == "max_tokens"));
}

#[tokio::test]
async fn test_placeholder_outputs() {
    let bus = EventBus::new(16);
    let ctx = create_test_context(&bus);
    let config = NodeConfig::new();

    let stt = SpeechToTextNode
        .execute(&inputs(&[("audio", Value::from("UklGRg=="))]), &config, &ctx)
        .await
        .unwrap();
    assert_eq!(stt["text"], Value::from("Transcribed text would appear here"));
    assert_eq!(stt["confidence"], Value::Number(0.95));

    let tts = TextToSpeechNode
        .execute(&inputs(&[("text", Value::from("hi"))]), &config, &ctx)
        .await
        .unwrap();
    assert_eq!(tts["audio"], Value::from("base64_encoded_audio_data_would_be_here"));
    assert_eq!(tts["duration"], Value::Number(3.5));

    let image = ImageGenerationNode
        .execute(&inputs(&[("prompt", Value::from("a cat"))]), &config, &ctx)
        .await
        .unwrap();
    assert_eq!(image["width"], Value::Integer(512));
    assert_eq!(image["height"], Value::Integer(512));
}

#[tokio::test]
async fn test_text_to_speech_rejects_non_string_voice() {
    let bus = EventBus::new(16);
    let ctx = create_test_context(&bus);

    let err = TextToSpeechNode
        .execute(
            &inputs(&[("text", Value::from("hi")), ("voice", Value::Integer(3))]),
            &NodeConfig::new(),
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_debug_node_reports_message() {
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let ctx = create_test_context(&bus);

    let outputs = DebugNode
        .execute(&inputs(&[("message", Value::from("ping"))]), &NodeConfig::new(), &ctx)
        .await
        .unwrap();
    assert_eq!(outputs["message"], Value::from("ping"));

    let first = events.try_recv().unwrap();
    assert!(matches!(
        first,
        ExecutionEvent::NodeEvent { event: maticore::NodeEvent::Info { ref message }, .. }
            if message == "DEBUG: ping"
    ));

    let outputs = DebugNode
        .execute(&PortValues::new(), &NodeConfig::new(), &ctx)
        .await
        .unwrap();
    assert_eq!(outputs["message"], Value::from("(no message)"));
}

#[tokio::test]
async fn test_delay_passes_inputs_through() {
    let bus = EventBus::new(16);
    let ctx = create_test_context(&bus);
    let config = NodeConfig::from([("delay_ms".to_string(), Value::Integer(10))]);
    let data = inputs(&[("anything", Value::Bool(true))]);

    let outputs = DelayNode.execute(&data, &config, &ctx).await.unwrap();
    assert_eq!(outputs, data);
}

#[tokio::test]
async fn test_delay_stops_on_cancellation() {
    let bus = EventBus::new(16);
    let ctx = create_test_context(&bus);
    let config = NodeConfig::from([("delay_ms".to_string(), Value::Integer(60_000))]);

    ctx.cancellation.cancel();
    let started = Instant::now();
    DelayNode.execute(&PortValues::new(), &config, &ctx).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_registry_lists_builtins() {
    let registry = builtin_registry().unwrap();
    assert_eq!(
        registry.list_types(),
        vec![
            "debug.log",
            "image-generation",
            "speech-to-text",
            "text-generation",
            "text-to-speech",
            "time.delay",
        ]
    );

    let meta = registry.metadata("text-generation").unwrap();
    assert_eq!(meta.category, "AI");
    assert_eq!(meta.inputs.len(), 2);

    let mut registry = registry;
    assert!(matches!(
        matinodes::register_all(&mut registry),
        Err(maticore::WorkflowError::DuplicateNodeType(_))
    ));
}

#[tokio::test]
async fn test_generate_then_speak() {
    let registry = Arc::new(builtin_registry().unwrap());
    let store = Arc::new(InMemoryRunStore::new());
    let runtime = FlowRuntime::new(registry, store.clone(), RuntimeConfig::default());

    let mut wf = Workflow::new("generate-then-speak");
    wf.add_node(NodeSpec::new("gen", "text-generation").with_input_ports(vec![
        PortSpec::new("prompt", DataType::String).with_default("Hello"),
        PortSpec::new("max_tokens", DataType::Integer).optional().with_default(100i64),
    ]));
    wf.add_node(NodeSpec::new("speak", "text-to-speech").with_input_ports(vec![
        PortSpec::new("text", DataType::String),
        PortSpec::new("voice", DataType::String).optional(),
    ]));
    wf.connect("gen", "text", "speak", "text");

    let run_id = store.create_run().run_id;
    let state = runtime.start(&wf, run_id).await.unwrap();

    assert_eq!(state.status, RunStatus::Completed);
    assert_eq!(state.progress, 100.0);
    assert_eq!(state.node_status("speak"), Some(NodeStatus::Completed));

    let speak_inputs = state.node_states["speak"].inputs.as_ref().unwrap();
    assert_eq!(speak_inputs["text"], Value::from("Generated text for prompt: Hello"));
    assert!(!speak_inputs.contains_key("voice"));
    assert_eq!(state.node_results["speak"]["duration"], Value::Number(3.5));
}
