pub mod decode;
pub mod layout;
pub mod parser;

pub use decode::decode_feed;
pub use layout::ColumnLayout;
pub use parser::{parse_inventory_snapshot, parse_number, parse_product_master};
