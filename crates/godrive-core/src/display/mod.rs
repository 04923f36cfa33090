pub mod format;
pub mod table;

pub use format::{PriceValue, format_price};
pub use table::TableDisplay;
