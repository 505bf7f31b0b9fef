//! Adapters implementing the application ports over real I/O.

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;
