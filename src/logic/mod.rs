pub mod calculations;
pub mod composer;
pub mod fusion;
pub mod intent;
pub mod orchestrator;
pub mod resolver;
pub mod rules;

pub use composer::ResponseComposer;
pub use fusion::{DataFusionEngine, DefaultLocationMemo};
pub use intent::{IntentClassifier, QueryMentions};
pub use orchestrator::{QueryOrchestrator, QueryOutcome};
pub use resolver::RegionResolver;
pub use rules::RecommendationEngine;
