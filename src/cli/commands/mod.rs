//! CLI command implementations.

mod assemble;
mod config;
mod doctor;
mod fetch;
mod run;
mod script;
mod speak;

pub use assemble::run_assemble;
pub use config::run_config;
pub use doctor::run_doctor;
pub use fetch::run_fetch;
pub use run::run_pipeline;
pub use script::run_script;
pub use speak::run_speak;
