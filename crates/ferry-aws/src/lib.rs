//! EC2 implementation of the compute provider seam.
mod ec2;
pub use ec2::Ec2Compute;

mod request;
