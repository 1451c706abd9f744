//! Data models for bistro

pub mod menu;
pub mod order;

pub use menu::{available_categories, MenuItem, MenuItemUpdate, NewMenuItem};
pub use order::{NewOrder, Order, OrderDraft, OrderLineItem, OrderStatus, OrderType};
