pub mod error;
pub mod llm_config;
pub mod query_result;
pub mod table_schema;
pub mod translation;
