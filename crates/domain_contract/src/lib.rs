//! Contract Domain
//!
//! Agreements generated for orders from predefined templates, stored with a
//! PDF document and renewable once by the buyer.

pub mod contract;
pub mod template;
pub mod document;
pub mod error;
pub mod ports;
pub mod services;

pub use contract::{Contract, ContractStatus, DEFAULT_RENEWAL_TERMS, MAX_RENEWALS};
pub use template::{ContractPlaceholders, PredefinedContract, PredefinedContractType};
pub use document::{is_pdf, render_pdf, ContractDocument};
pub use error::ContractError;
pub use ports::ContractPort;
pub use services::ContractService;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockContractPort;
