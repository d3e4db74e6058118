//! JSON-RPC over HTTP transport for the import bridge
pub mod envelope;
pub mod session;

pub use envelope::{RpcRequest, RpcResponse};
pub use session::{HttpSession, HttpSessionFactory};
