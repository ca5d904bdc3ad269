//! Push message classification and routing.
//!
//! A venue registers a [`DescriptorTable`] once at startup. Every text frame
//! received on a push connection is run through [`classify`], which either
//! yields one typed message or a [`ClassifyError`]. [`PushRouter`] forwards
//! classified messages to per-channel consumers, and [`PushSession`] drives a
//! tungstenite connection into a router.

pub mod bitstamp;
mod classifier;
mod error;
mod router;
mod session;

pub use classifier::classify;
pub use classifier::ChannelDescriptor;
pub use classifier::Classified;
pub use classifier::Decoder;
pub use classifier::DescriptorTable;
pub use classifier::DescriptorTableBuilder;
pub use classifier::EventMatch;
pub use classifier::Route;
pub use classifier::CONFIRMATION_ROUTE;
pub use error::ClassifyError;
pub use error::RejectReason;
pub use error::Result;
pub use error::SessionError;
pub use router::PushFailure;
pub use router::PushRouter;
pub use router::PushRouterBuilder;
pub use router::RouterStats;
pub use session::PushSession;
pub use session::SessionConfig;
