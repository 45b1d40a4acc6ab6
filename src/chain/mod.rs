//! Step chains: endpoints, their steps, and the transactions the steps share.

mod context;
mod endpoint;
mod step;

pub use context::{SharedContext, SharedTransaction};
pub use endpoint::{ChainPhase, EndPoint};
pub use step::{NoopStep, Step};
