pub mod analyzer;
pub mod config;
pub mod error;
pub mod locale;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod security;
pub mod structure;
pub mod translator;
pub mod validator;
