use std::io::BufWriter;

use anyhow::{Result, anyhow};
use printpdf::*;

use crate::models::{BillingContact, Invoice, line_amounts};

/// Renders an invoice as a single A4 page. Returns PDF bytes.
pub fn render_invoice(invoice: &Invoice, contact: &BillingContact) -> Result<Vec<u8>> {
    let title = format!("Invoice {}", invoice.invoice_number);
    let (doc, page1, layer1) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;

    let mut y = Mm(280.0);

    // Header
    layer.use_text(&title, 16.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    layer.use_text(
        format!("Issue date: {}", invoice.issue_date),
        9.0, Mm(20.0), y, &font,
    );
    y -= Mm(10.0);

    // Client block
    layer.use_text("BILLED TO:", 11.0, Mm(20.0), y, &bold);
    y -= Mm(5.5);
    layer.use_text(
        format!("{} {}", contact.first_name, contact.last_name),
        10.0, Mm(25.0), y, &font,
    );
    y -= Mm(4.5);
    if let Some(ref tax_id) = contact.tax_id {
        layer.use_text(format!("Tax ID: {}", tax_id), 9.0, Mm(25.0), y, &font);
        y -= Mm(4.5);
    }
    if let Some(ref address) = contact.address {
        layer.use_text(address, 9.0, Mm(25.0), y, &font);
        y -= Mm(4.5);
    }
    let locality = [
        contact.postal_code.as_deref(),
        contact.city.as_deref(),
        contact.province.as_deref(),
    ]
    .iter()
    .flatten()
    .copied()
    .collect::<Vec<_>>()
    .join(" ");
    if !locality.is_empty() {
        layer.use_text(&locality, 9.0, Mm(25.0), y, &font);
        y -= Mm(4.5);
    }
    y -= Mm(6.0);

    // Line table
    layer.use_text("Description", 9.0, Mm(20.0), y, &bold);
    layer.use_text("Qty", 9.0, Mm(110.0), y, &bold);
    layer.use_text("Price", 9.0, Mm(125.0), y, &bold);
    layer.use_text("Disc%", 9.0, Mm(145.0), y, &bold);
    layer.use_text("VAT%", 9.0, Mm(160.0), y, &bold);
    layer.use_text("Amount", 9.0, Mm(178.0), y, &bold);
    y -= Mm(5.0);

    for line in &invoice.lines {
        let amounts = line_amounts(line);
        let description: String = line.description.chars().take(50).collect();
        layer.use_text(&description, 9.0, Mm(20.0), y, &font);
        layer.use_text(format!("{}", line.quantity), 9.0, Mm(110.0), y, &font);
        layer.use_text(format!("{:.2}", line.unit_price), 9.0, Mm(125.0), y, &font);
        layer.use_text(format!("{:.1}", line.discount_percent), 9.0, Mm(145.0), y, &font);
        layer.use_text(format!("{:.1}", line.vat_percent), 9.0, Mm(160.0), y, &font);
        layer.use_text(format!("{:.2}", amounts.base_amount), 9.0, Mm(178.0), y, &font);
        y -= Mm(4.5);
    }
    y -= Mm(8.0);

    // Totals block
    let rows: [(&str, f64); 5] = [
        ("Base", invoice.base_amount),
        ("VAT", invoice.vat_amount),
        ("IRPF", -invoice.irpf_amount),
        ("Retention", -invoice.retention_amount),
        ("Discount applied", invoice.discount_amount),
    ];
    for (label, amount) in rows {
        layer.use_text(label, 9.0, Mm(130.0), y, &font);
        layer.use_text(format!("{:.2}", amount), 9.0, Mm(178.0), y, &font);
        y -= Mm(4.5);
    }
    y -= Mm(2.0);
    layer.use_text("TOTAL", 11.0, Mm(130.0), y, &bold);
    layer.use_text(format!("{:.2}", invoice.total), 11.0, Mm(178.0), y, &bold);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| anyhow!("PDF save error: {e}"))?;
    buf.into_inner()
        .map_err(|e| anyhow!("PDF buffer error: {e}"))
}
