//! Domain models for the Labelworks inventory engine

mod inventory;
mod length_adjustment;
mod material;
mod purchase_order;

pub use inventory::*;
pub use length_adjustment::*;
pub use material::*;
pub use purchase_order::*;
