//! Page geometry for bill receipts.
//!
//! Positions are PDF points measured from the top-left corner of the page;
//! `y` is the top of the line box. Converting to PDF's bottom-left origin is
//! left to the writer.

use chrono::{DateTime, Local, Utc};

use super::fonts::{text_width, wrap, FontWeight};
use super::ReceiptOptions;
use crate::models::Bill;

/// US Letter.
pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;
pub const MARGIN: f64 = 40.0;

pub const TITLE_SIZE: f64 = 20.0;
pub const BODY_SIZE: f64 = 12.0;

/// Helvetica ascender minus descender plus line gap, per unit of font size.
pub const LINE_HEIGHT: f64 = 1.156;
/// Helvetica ascender per unit of font size; baseline offset from line top.
pub const ASCENT: f64 = 0.718;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub x: f64,
    pub width: f64,
}

pub const COLUMNS: [Column; 5] = [
    Column { x: 50.0, width: 100.0 },
    Column { x: 150.0, width: 50.0 },
    Column { x: 200.0, width: 60.0 },
    Column { x: 260.0, width: 70.0 },
    Column { x: 330.0, width: 70.0 },
];

pub const HEADERS: [&str; 5] = ["Name", "Qty", "Price", "Discount", "Total"];

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub weight: FontWeight,
}

/// Horizontal underline.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub texts: Vec<TextRun>,
    pub rules: Vec<Rule>,
}

/// Creation timestamp as shown on the receipt, in the host's local zone.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Shortest decimal form: `2`, `1.5`, `12.25`.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// Lays out the full receipt. `date` is the already-formatted creation time.
pub fn layout_receipt(bill: &Bill, options: &ReceiptOptions, date: &str) -> Vec<PageLayout> {
    let mut cursor = Cursor::new();
    let content_width = PAGE_WIDTH - 2.0 * MARGIN;

    for line in wrap(&options.title, content_width, FontWeight::Regular, TITLE_SIZE) {
        let x = MARGIN + (content_width - text_width(&line, FontWeight::Regular, TITLE_SIZE)) / 2.0;
        cursor.line(line, x, TITLE_SIZE, FontWeight::Regular);
    }
    cursor.move_down(1.0, TITLE_SIZE);

    for detail in [
        format!("Customer Name: {}", bill.customer_name),
        format!("Bill ID: {}", bill.id.to_hex()),
        format!("Date: {}", date),
    ] {
        cursor.paragraph(&detail, MARGIN, content_width, BODY_SIZE, FontWeight::Regular);
    }
    cursor.move_down(1.0, BODY_SIZE);

    cursor.underlined("Items:", MARGIN, BODY_SIZE);
    cursor.move_down(0.5, BODY_SIZE);

    cursor.header_row();

    for item in &bill.items {
        let cells = [
            item.name.clone(),
            format_number(item.quantity),
            format_amount(item.price),
            format!("{}%", format_number(item.discount)),
            format_amount(item.selling_price),
        ];
        cursor.row(&cells, FontWeight::Regular, true);
    }

    cursor.move_down(1.0, BODY_SIZE);
    for total in [
        format!("Total Items: {}", format_number(bill.total_items)),
        format!(
            "Total Amount: {}{}",
            options.currency_symbol,
            format_amount(bill.total_amount)
        ),
    ] {
        cursor.ensure_room(line_height(BODY_SIZE), false);
        cursor.line(total, COLUMNS[0].x, BODY_SIZE, FontWeight::Bold);
    }

    cursor.finish()
}

fn line_height(size: f64) -> f64 {
    size * LINE_HEIGHT
}

struct Cursor {
    done: Vec<PageLayout>,
    page: PageLayout,
    y: f64,
}

impl Cursor {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            page: PageLayout::default(),
            y: MARGIN,
        }
    }

    fn move_down(&mut self, lines: f64, size: f64) {
        self.y += lines * line_height(size);
    }

    fn at_page_top(&self) -> bool {
        self.page.texts.is_empty() && self.page.rules.is_empty()
    }

    /// Starts a new page if `height` would cross the bottom margin. A block
    /// taller than a page is placed anyway rather than looping.
    fn ensure_room(&mut self, height: f64, repeat_header: bool) {
        if self.y + height <= PAGE_HEIGHT - MARGIN || self.at_page_top() {
            return;
        }
        self.done.push(std::mem::take(&mut self.page));
        self.y = MARGIN;
        if repeat_header {
            self.header_row();
        }
    }

    fn place(&mut self, text: String, x: f64, size: f64, weight: FontWeight) {
        self.page.texts.push(TextRun {
            text,
            x,
            y: self.y,
            size,
            weight,
        });
    }

    fn line(&mut self, text: String, x: f64, size: f64, weight: FontWeight) {
        self.place(text, x, size, weight);
        self.move_down(1.0, size);
    }

    fn paragraph(&mut self, text: &str, x: f64, width: f64, size: f64, weight: FontWeight) {
        for line in wrap(text, width, weight, size) {
            self.ensure_room(line_height(size), false);
            self.line(line, x, size, weight);
        }
    }

    fn underlined(&mut self, text: &str, x: f64, size: f64) {
        let width = text_width(text, FontWeight::Regular, size);
        let y = self.y + size * ASCENT + size * 0.1;
        self.page.rules.push(Rule {
            x1: x,
            x2: x + width,
            y,
        });
        self.line(text.to_string(), x, size, FontWeight::Regular);
    }

    fn header_row(&mut self) {
        let headers = HEADERS.map(str::to_string);
        self.row(&headers, FontWeight::Bold, false);
        self.move_down(0.5, BODY_SIZE);
    }

    /// One table row. Cells wrap inside their column and the row is as tall
    /// as its tallest cell.
    fn row(&mut self, cells: &[String; 5], weight: FontWeight, repeat_header: bool) {
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(COLUMNS.iter())
            .map(|(cell, column)| wrap(cell, column.width, weight, BODY_SIZE))
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        let height = lines as f64 * line_height(BODY_SIZE);

        self.ensure_room(height, repeat_header);

        let top = self.y;
        for (cell_lines, column) in wrapped.into_iter().zip(COLUMNS.iter()) {
            for (i, text) in cell_lines.into_iter().enumerate() {
                self.page.texts.push(TextRun {
                    text,
                    x: column.x,
                    y: top + i as f64 * line_height(BODY_SIZE),
                    size: BODY_SIZE,
                    weight,
                });
            }
        }
        self.y = top + height;
    }

    fn finish(mut self) -> Vec<PageLayout> {
        self.done.push(self.page);
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bill, BillDraft, BillItem};

    fn bill_with(items: Vec<BillItem>) -> Bill {
        Bill::new(BillDraft {
            customer_name: "ASHA RAO".to_string(),
            total_amount: items.iter().map(|i| i.selling_price).sum(),
            total_items: items.iter().map(|i| i.quantity).sum(),
            original_amount: 0.0,
            total_savings: 0.0,
            items,
        })
    }

    fn item(name: &str, quantity: f64, price: f64, discount: f64) -> BillItem {
        BillItem {
            name: name.to_string(),
            quantity,
            price,
            discount,
            selling_price: quantity * price * (1.0 - discount / 100.0),
            original_amount: quantity * price,
        }
    }

    fn options() -> ReceiptOptions {
        ReceiptOptions::default()
    }

    fn find<'a>(page: &'a PageLayout, text: &str) -> &'a TextRun {
        page.texts
            .iter()
            .find(|t| t.text == text)
            .unwrap_or_else(|| panic!("no text run {text:?}"))
    }

    #[test]
    fn test_title_is_centered() {
        let pages = layout_receipt(&bill_with(vec![item("PEN", 1.0, 1.0, 0.0)]), &options(), "d");
        let title = find(&pages[0], "Bill Receipt");
        let width = text_width("Bill Receipt", FontWeight::Regular, TITLE_SIZE);

        assert_eq!(title.size, TITLE_SIZE);
        assert!((title.x + width / 2.0 - PAGE_WIDTH / 2.0).abs() < 1e-9);
        assert_eq!(title.y, MARGIN);
    }

    #[test]
    fn test_details_are_left_aligned_in_order() {
        let bill = bill_with(vec![item("PEN", 1.0, 1.0, 0.0)]);
        let pages = layout_receipt(&bill, &options(), "1/2/2026, 3:04:05 PM");

        let customer = find(&pages[0], "Customer Name: ASHA RAO");
        let id = find(&pages[0], &format!("Bill ID: {}", bill.id.to_hex()));
        let date = find(&pages[0], "Date: 1/2/2026, 3:04:05 PM");

        assert!([customer.x, id.x, date.x].iter().all(|x| *x == MARGIN));
        assert!(customer.y < id.y && id.y < date.y);
    }

    #[test]
    fn test_items_label_is_underlined() {
        let pages = layout_receipt(&bill_with(vec![item("PEN", 1.0, 1.0, 0.0)]), &options(), "d");
        let label = find(&pages[0], "Items:");

        assert_eq!(pages[0].rules.len(), 1);
        let rule = &pages[0].rules[0];
        assert_eq!(rule.x1, label.x);
        assert!(rule.x2 > rule.x1);
        assert!(rule.y > label.y && rule.y < label.y + line_height(BODY_SIZE));
    }

    #[test]
    fn test_header_row_geometry() {
        let pages = layout_receipt(&bill_with(vec![item("PEN", 1.0, 1.0, 0.0)]), &options(), "d");

        let xs: Vec<f64> = HEADERS.iter().map(|h| find(&pages[0], h).x).collect();
        assert_eq!(xs, vec![50.0, 150.0, 200.0, 260.0, 330.0]);
        assert!(HEADERS
            .iter()
            .all(|h| find(&pages[0], h).weight == FontWeight::Bold));
        let y = find(&pages[0], "Name").y;
        assert!(HEADERS.iter().all(|h| find(&pages[0], h).y == y));
    }

    #[test]
    fn test_item_row_formatting() {
        let pages = layout_receipt(
            &bill_with(vec![item("PEN", 2.0, 10.0, 12.5), item("INK", 1.5, 3.0, 0.0)]),
            &options(),
            "d",
        );
        let page = &pages[0];

        let row = ["PEN", "2", "10.00", "12.5%", "17.50"];
        let y = find(page, "PEN").y;
        for (text, column) in row.iter().zip(COLUMNS.iter()) {
            let run = find(page, text);
            assert_eq!(run.x, column.x);
            assert_eq!(run.y, y);
            assert_eq!(run.weight, FontWeight::Regular);
        }

        assert_eq!(find(page, "1.5").x, 150.0);
        assert_eq!(find(page, "0%").x, 260.0);
        assert!(find(page, "INK").y > y);
    }

    #[test]
    fn test_footer_totals() {
        let pages = layout_receipt(
            &bill_with(vec![item("PEN", 2.0, 10.0, 0.0), item("PAD", 1.0, 5.5, 0.0)]),
            &options(),
            "d",
        );

        let count = find(&pages[0], "Total Items: 3");
        let amount = find(&pages[0], "Total Amount: Rs.25.50");
        assert_eq!(count.weight, FontWeight::Bold);
        assert_eq!(amount.weight, FontWeight::Bold);
        assert!(amount.y > count.y);
        assert!(count.y > find(&pages[0], "PAD").y);
    }

    #[test]
    fn test_currency_symbol_is_configurable() {
        let options = ReceiptOptions {
            currency_symbol: "$".to_string(),
            ..ReceiptOptions::default()
        };
        let pages = layout_receipt(&bill_with(vec![item("PEN", 1.0, 2.0, 0.0)]), &options, "d");
        find(&pages[0], "Total Amount: $2.00");
    }

    #[test]
    fn test_long_names_wrap_within_the_name_column() {
        let pages = layout_receipt(
            &bill_with(vec![
                item("EXTRA LARGE BLUE BALLPOINT PEN REFILL", 1.0, 1.0, 0.0),
                item("PAD", 1.0, 1.0, 0.0),
            ]),
            &options(),
            "d",
        );
        let page = &pages[0];
        let name_lines: Vec<&TextRun> = page
            .texts
            .iter()
            .filter(|t| t.x == COLUMNS[0].x && t.weight == FontWeight::Regular)
            .filter(|t| t.text != "PAD")
            .collect();

        assert!(name_lines.len() > 1);
        for run in &name_lines {
            assert!(text_width(&run.text, FontWeight::Regular, BODY_SIZE) <= COLUMNS[0].width);
        }
        let last = name_lines.iter().map(|t| t.y).fold(f64::MIN, f64::max);
        assert!(find(page, "PAD").y > last);
    }

    #[test]
    fn test_many_items_paginate_with_repeated_header() {
        let items: Vec<BillItem> = (0..120)
            .map(|i| item(&format!("ITEM {i}"), 1.0, 1.0, 0.0))
            .collect();
        let pages = layout_receipt(&bill_with(items), &options(), "d");

        assert!(pages.len() > 1);
        for page in &pages {
            for run in &page.texts {
                assert!(run.y + line_height(run.size) <= PAGE_HEIGHT - MARGIN + 1e-9);
            }
        }
        for page in &pages[1..] {
            let header = find(page, "Name");
            assert_eq!(header.y, MARGIN);
            assert_eq!(header.weight, FontWeight::Bold);
        }

        let rows: usize = pages
            .iter()
            .flat_map(|p| &p.texts)
            .filter(|t| t.text.starts_with("ITEM "))
            .count();
        assert_eq!(rows, 120);
        find(pages.last().unwrap(), "Total Items: 120");
    }

    #[test]
    fn test_layout_is_deterministic_and_leaves_bill_untouched() {
        let bill = bill_with(vec![item("PEN", 3.0, 0.1, 33.3)]);
        let before = bill.clone();

        let first = layout_receipt(&bill, &options(), "d");
        let second = layout_receipt(&bill, &options(), "d");

        assert_eq!(first, second);
        assert_eq!(bill, before);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(12.25), "12.25");
        assert_eq!(format_amount(10.0), "10.00");
        assert_eq!(format_amount(0.125), "0.12");
    }
}
