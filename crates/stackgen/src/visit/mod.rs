//! visitor pattern helpers
mod visit_strings;
pub use visit_strings::VisitStrings;

/// Visitor that visits its subjects by reference
pub trait Visit<T: ?Sized> {
    fn visit(&mut self, value: &T);
}

// blanket impl for FnMut
impl<T: ?Sized, F> Visit<T> for F
where
    F: FnMut(&T),
{
    fn visit(&mut self, value: &T) {
        self(value)
    }
}
