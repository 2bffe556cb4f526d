pub mod sim;
pub mod transport;

pub use sim::{SimCall, SimTransport};
pub use transport::{Pager, QueryParams, Transport, TransportError};
