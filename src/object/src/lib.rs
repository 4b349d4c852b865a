pub mod fmt;
pub mod hash;

mod arena;
pub use arena::*;

mod bind;
pub use bind::*;

mod callable;
pub use callable::*;

mod closure;
pub use closure::*;

mod connections;
pub use connections::*;

mod custom;
pub use custom::*;

mod deferred;
pub use deferred::*;

mod error;
pub use error::*;

mod handle;
pub use handle::*;

mod name;
pub use name::*;

mod object;
pub use object::*;

mod signal;
pub use signal::*;

mod variant;
pub use variant::*;

#[cfg(test)]
mod test_util;
