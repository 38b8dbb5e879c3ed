pub mod bills;
pub mod calculator;
pub mod database;
pub mod metrics;
pub mod receipt;
pub mod store;

pub use bills::{BillError, BillService, Receipt};
pub use database::MongoDb;
pub use self::metrics::{get_metrics, init_metrics};
pub use receipt::{ReceiptError, ReceiptOptions};
pub use store::{parse_bill_id, BillPage, BillStore, InMemoryBillStore, StoreError};
