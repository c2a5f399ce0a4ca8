//! # iva-providers
//!
//! Chat-completion provider implementations for IVA.

pub mod openai;

pub use openai::OpenAiProvider;
