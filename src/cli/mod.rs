pub mod analyze;
pub mod history;
pub mod scan;
pub mod token;
