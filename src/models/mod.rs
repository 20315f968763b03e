mod filter;
mod item;
mod shopping_list;

pub use filter::Filter;
pub use item::{Item, ItemId};
pub use shopping_list::{is_valid_list_id, ShoppingList, DEFAULT_LIST_TITLE};
