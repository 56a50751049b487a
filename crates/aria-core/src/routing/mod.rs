//! Keyword routing of inbound messages to handlers.
//!
//! # Module layout
//!
//! - [`router`] — `Router`, `HandlerRegistration`, `RouteTarget`, `RouteDecision`
//! - [`error`] — `RoutingError`, `RoutingResult`

pub mod error;
pub mod router;

pub use error::{RoutingError, RoutingResult};
pub use router::{
    HandlerRegistration, HandlerStatus, KeywordCollision, RegistrationReport, RouteDecision,
    RouteTarget, Router, RouterStatus, RoutingRule, UNHANDLED,
};
