//! Point-of-sale domain types: catalog, cart, payment flow and orders.

pub mod catalog;
pub mod cart;
pub mod money;
pub mod notification;
pub mod order;
pub mod payment;
pub mod product;

pub use catalog::*;
pub use cart::*;
pub use money::*;
pub use notification::*;
pub use order::*;
pub use payment::*;
pub use product::*;
