//! Network address block derivation and octet bookkeeping.
//!
//! Accounts never author concrete CIDR blocks. They declare a pair of small
//! octets which are substituted into the organization-wide base blocks, and
//! the registry tracks those octets so overlapping assignments can be caught.

pub mod allocator;
pub mod registry;

// Re-export commonly used types
pub use allocator::{derive_network_service, parse_base_blocks, replace_octet, CidrBlock, OctetPosition};
pub use registry::OctetRegistry;
