pub mod bills;
pub mod health;
pub mod metrics;

pub use bills::{create_bill, delete_bill, get_bill, get_receipt, list_bills, update_bill};
pub use health::health_check;
pub use self::metrics::metrics;
