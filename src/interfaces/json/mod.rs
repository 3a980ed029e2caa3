pub mod response;
pub mod seed_reader;
