
pub mod diary;
pub mod input_validator;
pub mod logging;
pub mod picker;
pub mod security;
pub mod store;
