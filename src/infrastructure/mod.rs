pub mod bootstrap;
pub mod command_cache;
pub mod config;
pub mod db;
pub mod llm_clients;
pub mod response;
pub mod storage;
