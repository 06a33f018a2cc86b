//! AI Integration Layer
//!
//! Everything between a validated prediction request and a canonical
//! result: prompt construction, the provider client and its fallback
//! invoker, response normalization and visualization enrichment.

pub mod enrichment;
pub mod normalizer;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use enrichment::VisualizationEnricher;
pub use normalizer::{NormalizeContext, format_timestamp, normalize, strip_code_fences};
pub use prompt::{PromptBuilder, build_prediction_prompt, build_visualization_prompt};
pub use provider::{
    AttemptRecord, FallbackInvoker, GeminiClient, GenerationConfig, InlineData, InvocationStats,
    ModelClient, ModelResponse, ResponsePart, RetryPolicy, SharedModelClient, create_client,
};
pub use timeout::with_timeout;
