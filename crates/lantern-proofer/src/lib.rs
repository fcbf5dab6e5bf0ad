//! # Lantern Proofer
//!
//! Proof construction for Lantern.
//!
//! A [`ProoferCtx`] turns one Ethereum JSON-RPC request into a compact,
//! self-contained proof artifact that `lantern-core` can verify without
//! trusting any RPC provider. The context performs **no I/O**: it records
//! the upstream requests it needs (execution RPC and beacon API), yields
//! `Pending`, and resumes once the host has filled in responses. Requests
//! are deduplicated by content hash, so resumption always converges.
//!
//! ```ignore
//! let mut ctx = ProoferCtx::new("eth_getBalance", r#"["0xAB…", "latest"]"#, 1)?;
//! loop {
//!     match ctx.execute() {
//!         Status::Pending => host_serve(ctx.open_requests()),
//!         Status::Success => break,
//!         Status::Error => return Err(…),
//!     }
//! }
//! let artifact = ctx.proof().unwrap();
//! ```

pub mod beacon;
pub mod methods;
pub mod proofer;
pub mod rpc;
pub mod state;

pub use beacon::BeaconBlock;
pub use proofer::{Interrupt, ProofError, ProoferCtx, Status, Step};
pub use state::{DataRequest, Encoding, HttpMethod, RequestType, State};
