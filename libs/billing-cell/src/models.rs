use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub vat_percent: f64,
    #[serde(default)]
    pub irpf_percent: f64,
    #[serde(default)]
    pub retention_percent: f64,
}

/// Aggregated amounts, summed over per-line results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub base_amount: f64,
    pub vat_amount: f64,
    pub irpf_amount: f64,
    pub retention_amount: f64,
    pub discount_amount: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    /// Rows from the `invoice_lines` table; the invoices row itself only
    /// carries the aggregates.
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    pub base_amount: f64,
    pub vat_amount: f64,
    pub irpf_amount: f64,
    pub retention_amount: f64,
    pub discount_amount: f64,
    pub total: f64,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub lines: Vec<InvoiceLine>,
}

/// Client billing details as printed on the invoice. Fetched from the
/// clients table at render time so the PDF reflects the current address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingContact {
    pub first_name: String,
    pub last_name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
}

/// Per-line amounts. Computed exactly per line before any aggregation,
/// no global rate is assumed.
pub fn line_amounts(line: &InvoiceLine) -> InvoiceTotals {
    let gross = line.quantity * line.unit_price;
    let base = gross * (1.0 - line.discount_percent / 100.0);
    let vat = base * line.vat_percent / 100.0;
    let irpf = base * line.irpf_percent / 100.0;
    let retention = base * line.retention_percent / 100.0;

    InvoiceTotals {
        base_amount: base,
        vat_amount: vat,
        irpf_amount: irpf,
        retention_amount: retention,
        discount_amount: gross * line.discount_percent / 100.0,
        total: base + vat - irpf - retention,
    }
}

pub fn compute_totals(lines: &[InvoiceLine]) -> InvoiceTotals {
    let mut totals = InvoiceTotals::default();
    for line in lines {
        let amounts = line_amounts(line);
        totals.base_amount += amounts.base_amount;
        totals.vat_amount += amounts.vat_amount;
        totals.irpf_amount += amounts.irpf_amount;
        totals.retention_amount += amounts.retention_amount;
        totals.discount_amount += amounts.discount_amount;
    }
    totals.total = totals.base_amount + totals.vat_amount
        - totals.irpf_amount - totals.retention_amount;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn line(qty: f64, price: f64, disc: f64, vat: f64, irpf: f64, ret: f64) -> InvoiceLine {
        InvoiceLine {
            description: "Session".to_string(),
            quantity: qty,
            unit_price: price,
            discount_percent: disc,
            vat_percent: vat,
            irpf_percent: irpf,
            retention_percent: ret,
        }
    }

    #[test]
    fn discounted_line_with_vat_and_irpf() {
        let amounts = line_amounts(&line(1.0, 100.0, 10.0, 21.0, 15.0, 0.0));
        assert!((amounts.base_amount - 90.0).abs() < EPS);
        assert!((amounts.vat_amount - 18.9).abs() < EPS);
        assert!((amounts.irpf_amount - 13.5).abs() < EPS);
        assert!((amounts.discount_amount - 10.0).abs() < EPS);
        assert!((amounts.total - 95.4).abs() < EPS);
    }

    #[test]
    fn retention_subtracts_from_total() {
        let amounts = line_amounts(&line(2.0, 50.0, 0.0, 0.0, 0.0, 5.0));
        assert!((amounts.base_amount - 100.0).abs() < EPS);
        assert!((amounts.retention_amount - 5.0).abs() < EPS);
        assert!((amounts.total - 95.0).abs() < EPS);
    }

    #[test]
    fn totals_aggregate_per_line_not_globally() {
        // Different rates per line; aggregating the bases and applying a
        // single rate would give the wrong answer.
        let lines = vec![
            line(1.0, 100.0, 0.0, 21.0, 0.0, 0.0),
            line(1.0, 100.0, 0.0, 10.0, 0.0, 0.0),
        ];
        let totals = compute_totals(&lines);
        assert!((totals.base_amount - 200.0).abs() < EPS);
        assert!((totals.vat_amount - 31.0).abs() < EPS);
        assert!((totals.total - 231.0).abs() < EPS);
    }

    #[test]
    fn zero_rates_give_plain_sum() {
        let totals = compute_totals(&[line(3.0, 25.0, 0.0, 0.0, 0.0, 0.0)]);
        assert!((totals.base_amount - 75.0).abs() < EPS);
        assert!((totals.total - 75.0).abs() < EPS);
        assert!(totals.discount_amount.abs() < EPS);
    }

    #[test]
    fn empty_invoice_totals_are_zero() {
        assert_eq!(compute_totals(&[]), InvoiceTotals::default());
    }
}
