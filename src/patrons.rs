use crate::core::domain::Identifiable;

pub mod command;
pub mod controller;
pub mod domain;
pub mod dto;
pub mod factory;
pub mod repository;

pub trait Patron: Identifiable {
    fn patron_id(&self) -> i64;
    fn email(&self) -> &str;
    fn full_name(&self) -> String;
}

// emails are compared trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
