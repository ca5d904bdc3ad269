pub mod actor;
pub mod client;
pub mod context;
pub mod errors;
pub mod factory;
pub mod ftx;
pub mod request;
pub mod transport;

pub use actor::Actor;
pub use client::HttpClient;
pub use client::HttpClientConfig;
pub use context::ApiContext;
pub use context::AuthHeaders;
pub use context::EndpointContext;
pub use context::Protocol;
pub use errors::ActorError;
pub use errors::Result;
pub use errors::TransportError;
pub use factory::ActorFactory;
pub use request::HttpRequest;
pub use request::Method;
pub use request::RawResponse;
pub use request::RequestDescriptor;
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use transport::TransportFuture;
