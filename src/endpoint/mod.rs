//! Endpoint subsystem.
//!
//! The shapes of the collaborators the router talks to: addresses, calls and
//! callable providers.
//!
//! # Data Flow
//! ```text
//! "dubbo://10.20.3.3:20880/com.foo.BarService?methods=getFoo"
//!     → url.rs (ServiceUrl: host, port, path, params)
//!
//! Outgoing call
//!     → invocation.rs (method name, parameter types, arguments)
//!
//! Provider instance
//!     → invoker.rs (url + availability + invoke)
//! ```
//!
//! # Design Decisions
//! - ServiceUrl is an owned value; parsing delegates to the `url` crate
//! - Routing only reads from these types, it never invokes

pub mod invocation;
pub mod invoker;
pub mod url;

pub use invocation::{Invocation, RpcInvocation};
pub use invoker::{Invoker, RpcError, RpcResult, StaticInvoker};
pub use url::{ServiceUrl, UrlError};
