//! Pluggable VM-provisioning and payment backends.
//!
//! Backends are described in a JSON file next to the primary config and are
//! instantiated once at startup into a [`registry::ProviderRegistry`]. A VM
//! backend's registered name is the name of the region it serves.

pub mod config;
pub mod payment;
pub mod registry;
pub mod vm;

mod http;

pub use config::{InterfaceConfig, PaymentProviderConfig, ProviderConfigError, VmProviderConfig};
pub use payment::{PaymentCheckout, PaymentInterface, PaymentRequest};
pub use registry::ProviderRegistry;
pub use vm::{ProviderPlan, VmCreateRequest, VmInfo, VmInterface, VmPlanLister, VmStatus};
