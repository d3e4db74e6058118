//! Method lookup by name and number of arguments

use crate::types::{MethodSignature, TypeDescriptor};
use std::sync::Arc;

/// Find the first method called `name` taking `arg_count` parameters.
///
/// Interfaces are scanned in resolution order, then methods in declaration
/// order. Overloads sharing name and arity are not told apart by parameter
/// types: the first one found wins.
pub fn find_method<'a>(
    interfaces: &'a [Arc<TypeDescriptor>],
    name: &str,
    arg_count: usize,
) -> Option<&'a MethodSignature> {
    interfaces
        .iter()
        .flat_map(|ty| ty.methods.iter())
        .find(|method| method.name == name && method.arity() == arg_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interfaces() -> Vec<Arc<TypeDescriptor>> {
        vec![
            Arc::new(TypeDescriptor::new(
                "com.example.IFoo",
                vec![
                    MethodSignature::new("hello", ["java.lang.String"]),
                    MethodSignature::new("hello", ["java.lang.String", "int"]),
                ],
            )),
            Arc::new(TypeDescriptor::new(
                "com.example.IBar",
                vec![
                    MethodSignature::new("hello", ["int"]),
                    MethodSignature::new("reset", Vec::<String>::new()),
                ],
            )),
        ]
    }

    #[test]
    fn test_find_by_name_and_arity() {
        let interfaces = interfaces();
        let method = find_method(&interfaces, "hello", 2).unwrap();
        assert_eq!(method.parameter_types, vec!["java.lang.String", "int"]);

        let method = find_method(&interfaces, "reset", 0).unwrap();
        assert_eq!(method.name, "reset");
    }

    #[test]
    fn test_first_interface_wins_on_ambiguity() {
        let interfaces = interfaces();
        let method = find_method(&interfaces, "hello", 1).unwrap();
        assert_eq!(method.parameter_types, vec!["java.lang.String"]);
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let interfaces = interfaces();
        let first = find_method(&interfaces, "hello", 1).unwrap();
        for _ in 0..10 {
            assert!(std::ptr::eq(first, find_method(&interfaces, "hello", 1).unwrap()));
        }
    }

    #[test]
    fn test_not_found() {
        let interfaces = interfaces();
        assert!(find_method(&interfaces, "hello", 3).is_none());
        assert!(find_method(&interfaces, "goodbye", 0).is_none());
        assert!(find_method(&[], "hello", 1).is_none());
    }
}
