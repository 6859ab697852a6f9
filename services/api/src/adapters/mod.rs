pub mod db;
pub mod memory;
pub mod token;

pub use db::DbAdapter;
pub use memory::MemoryAdapter;
pub use token::JwtVerifier;
