pub mod find_patron_cmd;
pub mod get_patron_cmd;
pub mod register_patron_cmd;
