// File: `crates/rmt-core/src/lib.rs`
pub mod bcounter;
pub mod convergent;
pub mod error;
pub mod gcounter;
pub mod ids;
pub mod pncounter;
pub mod vclock;

pub use bcounter::BCounter;
pub use convergent::Convergent;
pub use error::CounterError;
pub use gcounter::GCounter;
pub use ids::ReplicaId;
pub use pncounter::PNCounter;
pub use vclock::VectorClock;
