mod mode;
pub use mode::Mode;

mod start;
pub use start::{BootstrapSpec, InstanceSizing, NetworkPlacement, StartSpec};

mod stop;
pub use stop::StopSpec;
