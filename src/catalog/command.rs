pub mod add_copies_cmd;
pub mod get_book_cmd;
pub mod search_books_cmd;
pub mod sync_book_cmd;
