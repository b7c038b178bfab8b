//! Integration flows across the bridge crates.

pub mod bridge_flows;
pub mod dispatch_flows;
pub mod routing;
