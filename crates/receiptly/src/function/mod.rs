//! Serverless deployment face: gateway proxy events in, gateway responses out.

pub mod event;
pub mod handler;

pub use event::{GatewayRequest, GatewayResponse};
pub use handler::{FILE_ENCODING_HEADER, FunctionHandler, transport_hint};
