use crate::core::domain::Identifiable;

pub mod model;

pub trait Book: Identifiable {
    fn title(&self) -> &str;
    fn available_copies(&self) -> i64;

    fn is_available(&self) -> bool {
        self.available_copies() > 0
    }

    // case-insensitive substring match on isbn or title
    fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.id().to_lowercase().contains(term.as_str()) || self.title().to_lowercase().contains(term.as_str())
    }
}
