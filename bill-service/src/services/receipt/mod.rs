//! PDF receipts for stored bills.
//!
//! Rendering runs in two steps: [`layout::layout_receipt`] positions every
//! piece of text on US Letter pages, then [`render`] writes those pages with
//! the built-in Helvetica fonts. Nothing here touches storage.

pub mod fonts;
pub mod layout;

use printpdf::lopdf::{self, Object, StringFormat};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, Point, Pt};
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::ReceiptConfig;
use crate::models::Bill;
use fonts::FontWeight;
use layout::{PageLayout, ASCENT, PAGE_HEIGHT, PAGE_WIDTH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptOptions {
    pub title: String,
    /// Prefix for the total amount. Built-in fonts only cover WinAnsi, so
    /// the default spells out the rupee.
    pub currency_symbol: String,
}

impl Default for ReceiptOptions {
    fn default() -> Self {
        Self {
            title: "Bill Receipt".to_string(),
            currency_symbol: "Rs.".to_string(),
        }
    }
}

impl From<&ReceiptConfig> for ReceiptOptions {
    fn from(config: &ReceiptConfig) -> Self {
        Self {
            title: config.title.clone(),
            currency_symbol: config.currency_symbol.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("Receipt task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn pdf_error<E: std::fmt::Debug>(err: E) -> ReceiptError {
    ReceiptError::Pdf(format!("{err:?}"))
}

/// Renders `bill` to a complete PDF document.
pub fn render(bill: &Bill, options: &ReceiptOptions) -> Result<Vec<u8>, ReceiptError> {
    let date = layout::format_timestamp(&bill.created_at);
    let pages = layout::layout_receipt(bill, options, &date);
    write_pdf(bill, options, &pages)
}

/// [`render`] on the blocking pool, for use from request handlers.
pub async fn render_async(bill: Bill, options: ReceiptOptions) -> Result<Vec<u8>, ReceiptError> {
    tokio::task::spawn_blocking(move || render(&bill, &options)).await?
}

fn to_mm(points: f64) -> Mm {
    Mm::from(Pt(points as f32))
}

fn write_pdf(
    bill: &Bill,
    options: &ReceiptOptions,
    pages: &[PageLayout],
) -> Result<Vec<u8>, ReceiptError> {
    let created = OffsetDateTime::from_unix_timestamp(bill.created_at.timestamp())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);

    let (doc, first_page, first_layer) = PdfDocument::new(
        options.title.as_str(),
        to_mm(PAGE_WIDTH),
        to_mm(PAGE_HEIGHT),
        "Receipt",
    );
    let doc = doc
        .with_document_id(bill.id.to_hex())
        .with_creation_date(created)
        .with_mod_date(created)
        .with_metadata_date(created);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(to_mm(PAGE_WIDTH), to_mm(PAGE_HEIGHT), "Receipt");
            doc.get_page(page_index).get_layer(layer_index)
        };

        for run in &page.texts {
            let font: &IndirectFontRef = match run.weight {
                FontWeight::Regular => &regular,
                FontWeight::Bold => &bold,
            };
            let baseline = PAGE_HEIGHT - (run.y + run.size * ASCENT);
            layer.use_text(
                run.text.as_str(),
                run.size as f32,
                to_mm(run.x),
                to_mm(baseline),
                font,
            );
        }

        for rule in &page.rules {
            let y = to_mm(PAGE_HEIGHT - rule.y);
            layer.set_outline_thickness(0.75);
            layer.add_line(Line {
                points: vec![
                    (Point::new(to_mm(rule.x1), y), false),
                    (Point::new(to_mm(rule.x2), y), false),
                ],
                is_closed: false,
            });
        }
    }

    let bytes = doc.save_to_bytes().map_err(pdf_error)?;
    pin_trailer_id(&bytes, &bill.id.to_hex())
}

/// printpdf writes a random instance ID into the trailer on every save.
/// Both trailer IDs are replaced with `id` so the same bill always yields
/// the same bytes.
fn pin_trailer_id(bytes: &[u8], id: &str) -> Result<Vec<u8>, ReceiptError> {
    let mut pdf = lopdf::Document::load_mem(bytes).map_err(pdf_error)?;
    let id = Object::String(id.as_bytes().to_vec(), StringFormat::Literal);
    pdf.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let mut out = Vec::with_capacity(bytes.len());
    pdf.save_to(&mut out).map_err(pdf_error)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillDraft, BillItem};

    fn bill(count: usize) -> Bill {
        let items: Vec<BillItem> = (0..count)
            .map(|i| BillItem {
                name: format!("ITEM {i}"),
                quantity: 2.0,
                price: 10.0,
                discount: 10.0,
                selling_price: 18.0,
                original_amount: 20.0 * (i + 1) as f64,
            })
            .collect();
        Bill::new(BillDraft {
            customer_name: "ASHA RAO".to_string(),
            total_amount: 18.0 * count as f64,
            total_items: 2.0 * count as f64,
            original_amount: 20.0 * count as f64,
            total_savings: 2.0 * count as f64,
            items,
        })
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&bill(2), &ReceiptOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_render_handles_multiple_pages() {
        let long = bill(150);
        let pages = layout::layout_receipt(&long, &ReceiptOptions::default(), "d");
        assert!(pages.len() > 1);

        let short_pdf = render(&bill(1), &ReceiptOptions::default()).unwrap();
        let long_pdf = render(&long, &ReceiptOptions::default()).unwrap();
        assert!(long_pdf.starts_with(b"%PDF-"));
        assert!(long_pdf.len() > short_pdf.len());
    }

    #[test]
    fn test_render_is_byte_identical_for_the_same_bill() {
        let bill = bill(3);
        let options = ReceiptOptions::default();

        let first = render(&bill, &options).unwrap();
        let second = render(&bill, &options).unwrap();
        assert_eq!(first, second);

        let pdf = lopdf::Document::load_mem(&first).unwrap();
        let ids: Vec<&[u8]> = pdf
            .trailer
            .get(b"ID")
            .and_then(Object::as_array)
            .unwrap()
            .iter()
            .map(|id| id.as_str().unwrap())
            .collect();
        let hex = bill.id.to_hex();
        assert_eq!(ids, vec![hex.as_bytes(), hex.as_bytes()]);
    }

    #[test]
    fn test_render_differs_between_bills() {
        let options = ReceiptOptions::default();
        assert_ne!(
            render(&bill(2), &options).unwrap(),
            render(&bill(2), &options).unwrap()
        );
    }

    #[test]
    fn test_render_does_not_modify_bill() {
        let bill = bill(3);
        let before = bill.clone();
        render(&bill, &ReceiptOptions::default()).unwrap();
        assert_eq!(bill, before);
    }

    #[test]
    fn test_options_from_config() {
        let options = ReceiptOptions::from(&ReceiptConfig {
            title: "Shop Receipt".to_string(),
            currency_symbol: "$".to_string(),
        });
        assert_eq!(options.title, "Shop Receipt");
        assert_eq!(options.currency_symbol, "$");
    }

    #[tokio::test]
    async fn test_render_async() {
        let bytes = render_async(bill(1), ReceiptOptions::default())
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
