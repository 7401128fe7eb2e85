mod cache;
mod page;
mod server;

pub use page::parse_index_page;
pub use server::{Candidate, IndexServer};
