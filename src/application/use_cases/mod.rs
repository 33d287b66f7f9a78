pub mod audit_service;
pub mod nl_to_sql;
pub mod pattern_fallback;
pub mod run_command;
