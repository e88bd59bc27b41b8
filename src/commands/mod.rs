pub mod analyze;
pub mod convert;
pub mod files;
pub mod output;
pub mod validate;

pub use analyze::run_analyze;
pub use convert::run_convert;
pub use validate::run_validate;
