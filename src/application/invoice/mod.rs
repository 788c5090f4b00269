pub mod add_line_item;
pub mod create_invoice;
pub mod delete_invoice;
pub mod delete_line_item;
pub mod generate_packing_list;
pub mod get_invoice_details;
pub mod list_invoices;
pub mod mark_overdue_invoices;
pub mod record_payment;
pub mod transform_to_commercial;
pub mod update_invoice;
pub mod update_line_item;

#[cfg(test)]
pub(crate) mod test_support;

pub use add_line_item::{AddLineItemCommand, AddLineItemUseCase, LineItemResponse};
pub use create_invoice::{CreateInvoiceCommand, CreateInvoiceUseCase, LineItemInput};
pub use delete_invoice::{DeleteInvoiceCommand, DeleteInvoiceResponse, DeleteInvoiceUseCase};
pub use delete_line_item::{DeleteLineItemCommand, DeleteLineItemUseCase};
pub use generate_packing_list::{GeneratePackingListCommand, GeneratePackingListUseCase};
pub use get_invoice_details::{
  GetInvoiceDetailsCommand, GetInvoiceDetailsUseCase, InvoiceDetailsResponse, InvoiceTotalsDto,
  LineItemDto,
};
pub use list_invoices::{
  InvoiceListItemDto, ListInvoicesCommand, ListInvoicesResponse, ListInvoicesUseCase,
};
pub use mark_overdue_invoices::{
  MarkOverdueInvoicesCommand, MarkOverdueInvoicesResponse, MarkOverdueInvoicesUseCase,
};
pub use record_payment::{RecordPaymentCommand, RecordPaymentResponse, RecordPaymentUseCase};
pub use transform_to_commercial::{TransformToCommercialCommand, TransformToCommercialUseCase};
pub use update_invoice::{UpdateInvoiceCommand, UpdateInvoiceUseCase};
pub use update_line_item::{UpdateLineItemCommand, UpdateLineItemUseCase};
