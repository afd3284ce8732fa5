pub mod dir;
pub mod logging;
pub mod runtime;
