pub mod catalog;
pub mod index;
pub mod models;
pub mod pinecone;
pub mod qdrant;
pub mod webhook_log;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
