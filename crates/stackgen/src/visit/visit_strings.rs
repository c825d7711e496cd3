use super::Visit;
use crate::value::Value;

/// Recursively visit all string leaves of a value
///
/// Object keys are not visited, only values. Arrays and objects are walked in order.
pub trait VisitStrings {
    fn visit_strings(&self, visitor: &mut dyn Visit<str>);
}

impl VisitStrings for Value {
    fn visit_strings(&self, visitor: &mut dyn Visit<str>) {
        match self {
            Value::String(s) => visitor.visit(s),
            Value::Array(array) => {
                for value in array {
                    value.visit_strings(visitor);
                }
            }
            Value::Object(object) => object.visit_strings(visitor),
            Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Decimal(_) => {}
        }
    }
}

impl VisitStrings for crate::value::Object {
    fn visit_strings(&self, visitor: &mut dyn Visit<str>) {
        for value in self.values() {
            value.visit_strings(visitor);
        }
    }
}
