pub mod bill;

pub use bill::{normalize_text, Bill, BillDraft, BillItem, BillSort};
