pub mod forbidden_patterns;
pub mod required_fields;
pub mod sanitization;
pub mod timeframe;
pub mod whitelist;

pub use forbidden_patterns::ForbiddenPatternsRule;
pub use required_fields::RequiredFieldsRule;
pub use sanitization::SanitizationRule;
pub use timeframe::TimeframeRule;
pub use whitelist::WhitelistRule;
