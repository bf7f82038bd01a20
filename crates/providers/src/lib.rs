//! Language-model provider implementations for Casewise.
//!
//! All providers implement the `casewise_core::Provider` trait.

pub mod gemini;

pub use gemini::GeminiProvider;

/// Build the configured provider.
pub fn build_from_config(config: &casewise_config::AppConfig) -> GeminiProvider {
    GeminiProvider::new(&config.gemini.base_url)
}
