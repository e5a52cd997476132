pub mod accounts;
pub mod episodes;
pub mod responses;
