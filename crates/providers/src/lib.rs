//! Chat-completion provider implementations for ChatArbor.
//!
//! The OpenAI-compatible adapter covers the hosted endpoint the assistant
//! talks to; `ProviderFactory` owns client construction and caching.

pub mod factory;
pub mod openai_compat;

pub use factory::ProviderFactory;
pub use openai_compat::OpenAiCompatProvider;
