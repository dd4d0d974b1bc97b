// VeriText Core Services
// Request building, the inference boundary, and response contract enforcement

pub mod config_store;
pub mod media;
pub mod providers;
pub mod report;
pub mod request_spec;
pub mod schema;
pub mod session;
pub mod validation;
pub mod verification;

pub use config_store::{AppConfig, ConfigStore, ProxyConfig};
pub use media::MediaPayload;
pub use providers::{
    get_api_key, ContentPart, GeminiBoundary, InferenceBoundary, InferenceCall, ProviderError,
};
pub use report::render_report;
pub use request_spec::{
    request_spec, AnalysisPayload, AnalysisRequest, PreconditionError, RequestSpec,
    DEFAULT_MIN_TEXT_CHARS,
};
pub use session::DetectorSession;
pub use validation::parse_analysis;
pub use verification::{VerificationClient, VerificationError};
