pub mod books;
pub mod catalog;
pub mod checkout;
pub mod core;
pub mod fines;
pub mod gateway;
pub mod patrons;
pub mod utils;
