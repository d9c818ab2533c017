pub mod active_loans_cmd;
pub mod checkout_book_cmd;
pub mod return_book_cmd;
