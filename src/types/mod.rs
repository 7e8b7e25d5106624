//! Shared data types.
mod balance;
pub use balance::*;

mod escrow;
pub use escrow::*;

mod id;
pub use id::*;

mod object;
pub use object::*;

mod proposal;
pub use proposal::*;

mod wrapper;
pub use wrapper::*;
