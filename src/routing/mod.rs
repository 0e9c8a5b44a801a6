//! Payload delivery to the document store and notification channels.

pub mod payload;
pub mod router;
pub mod traits;

pub use payload::RoutingPayload;
pub use router::{Delivery, RouteReport, Router};
pub use traits::{DocumentSink, NotificationSink, NotifyChannel};
