pub mod use_cases;

pub use use_cases::nl_to_sql::NlToSqlUseCase;
pub use use_cases::run_command::RunCommandUseCase;
