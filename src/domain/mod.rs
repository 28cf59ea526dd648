pub mod error;
pub mod export;
pub mod llm_config;
pub mod session;
pub mod table;
pub mod test_case;
