pub mod biometric;
pub mod db;
pub mod http;
pub mod memory;
pub mod secure;

pub use biometric::UnsupportedBiometric;
pub use db::DbAdapter;
pub use http::HttpGateway;
pub use memory::MemoryStore;
pub use secure::KeyringStore;
