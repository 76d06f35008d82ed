//! Risk qualification: turns an indicator snapshot and a set of detected
//! signals into ranked trade plans, or into an explicit "do not trade"
//! verdict with machine-readable reasons.

pub mod assessor;
pub mod config;
pub mod contract;
pub mod error;
pub mod invalidation;
pub mod models;
pub mod reward;
pub mod scanner;
pub mod signals;
pub mod stop;
pub mod structure;
pub mod suppression;
pub mod timeframe;
pub mod traits;
pub mod vehicle;
pub mod volatility;

pub use assessor::RiskAssessor;
pub use config::{QualificationConfig, RiskProfile};
pub use error::{QualificationError, QualificationResult};
pub use invalidation::StructureInvalidationDetector;
pub use models::*;
pub use reward::StructuralRiskRewardCalculator;
pub use scanner::{AssessmentRequest, ScanEntry, ScanReport};
pub use stop::AtrStopCalculator;
pub use suppression::RuleBasedSuppressionEvaluator;
pub use timeframe::RegimeTimeframeSelector;
pub use traits::*;
pub use vehicle::RegimeVehicleSelector;
pub use volatility::AtrVolatilityClassifier;
