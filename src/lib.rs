/// TwisSpark - canned bot responses and a personal episode diary
///
/// Core library providing the response picker, the flat-file record store
/// and the HTTP dispatcher exposing both.

pub mod config;
pub mod core;
pub mod server;


pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
