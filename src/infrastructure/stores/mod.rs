mod key_value;
mod local;
mod remote;

pub use key_value::*;
pub use local::*;
pub use remote::*;
