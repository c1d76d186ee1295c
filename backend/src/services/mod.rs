//! Business logic services for the Labelworks backend

pub mod inventory;
pub mod length_adjustment;
pub mod purchase_order;
pub mod triggers;

pub use inventory::{InventoryService, RecomputeSummary};
pub use length_adjustment::LengthAdjustmentService;
pub use purchase_order::PurchaseOrderService;
pub use triggers::{ChangeEvent, ChangeListener, ChangeNotifier, ChangeOperation, ChangeSource};
