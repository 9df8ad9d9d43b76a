//! Placed orders and their status lifecycle.

mod model;
mod patch;
mod state;
mod value_objects;

pub use model::Order;
pub use patch::OrderPatch;
pub use state::{OrderStatus, PaymentStatus};
pub use value_objects::{OrderItem, ShippingAddress};
