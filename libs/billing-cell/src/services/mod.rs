pub mod invoice;
pub mod pdf;

pub use invoice::InvoiceService;
