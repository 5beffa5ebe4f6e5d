pub mod anthropic_extractor;
pub mod generic_extractor;
pub mod local_extractor;
pub mod openai_extractor;

pub use anthropic_extractor::AnthropicExtractor;
pub use generic_extractor::GenericExtractor;
pub use local_extractor::LocalExtractor;
pub use openai_extractor::OpenAiExtractor;
