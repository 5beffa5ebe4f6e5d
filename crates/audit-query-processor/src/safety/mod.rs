pub mod rule;
pub mod rules;
pub mod validator;

pub use rule::{RuleResult, Severity, ValidationResult, ValidationRule};
pub use validator::SafetyValidator;
