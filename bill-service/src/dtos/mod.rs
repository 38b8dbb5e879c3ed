pub mod bills;

pub use bills::{BillInput, BillListResponse, BillResponse, ListBillsParams, Pagination};
