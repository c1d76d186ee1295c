//! HTTP handlers for the Labelworks backend

mod health;
mod inventory;
mod length_adjustment;
mod purchase_order;

pub use health::*;
pub use inventory::*;
pub use length_adjustment::*;
pub use purchase_order::*;
