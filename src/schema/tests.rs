#[cfg(test)]
mod tests {
    use crate::interpreter::Value;
    use crate::schema::{Primitive, TypeSchema, VarType};
    use crate::tracer::{trace, Bindings, LineHook, TraceFault};

    fn schema_from(snapshots: Vec<Vec<(&'static str, Value)>>) -> TypeSchema {
        let run = move |hook: &mut dyn LineHook| -> Result<(), TraceFault> {
            for snapshot in &snapshots {
                let locals: Bindings = snapshot
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect();
                hook.on_statement(&locals);
            }
            Ok(())
        };
        TypeSchema::from_observations(&trace(&run))
    }

    #[test]
    fn test_float_dominates_integer() {
        let schema = schema_from(vec![
            vec![("x", Value::Integer(1))],
            vec![("x", Value::Float(1.5))],
        ]);
        assert_eq!(schema.resolve("x"), VarType::Float);
    }

    #[test]
    fn test_sequence_wins_over_integer() {
        let schema = schema_from(vec![
            vec![("x", Value::Integer(0))],
            vec![("x", Value::List(vec![Value::Integer(1), Value::Integer(2)]))],
        ]);
        assert_eq!(schema.resolve("x"), VarType::Sequence(Primitive::Int));
        assert_eq!(schema.capacity_hint("x"), Some(2));
    }

    #[test]
    fn test_float_elements_make_a_double_sequence() {
        let schema = schema_from(vec![vec![(
            "xs",
            Value::List(vec![Value::Integer(1), Value::Float(2.5)]),
        )]]);
        assert_eq!(schema.resolve("xs"), VarType::Sequence(Primitive::Double));
    }

    #[test]
    fn test_text_and_bool_classification() {
        let schema = schema_from(vec![vec![
            ("s", Value::String("hi".to_string())),
            ("flag", Value::Boolean(true)),
            ("nothing", Value::None),
        ]]);
        assert_eq!(schema.resolve("s"), VarType::Text);
        assert_eq!(schema.resolve("flag"), VarType::Integer);
        assert_eq!(schema.resolve("nothing"), VarType::Integer);
    }

    #[test]
    fn test_unobserved_name_defaults_to_integer() {
        let schema = schema_from(vec![vec![("x", Value::Float(0.5))]]);
        assert!(!schema.contains("y"));
        assert_eq!(schema.resolve("y"), VarType::Integer);
        assert_eq!(schema.capacity_hint("y"), None);
    }

    #[test]
    fn test_every_observed_name_has_an_entry() {
        let schema = schema_from(vec![
            vec![("a", Value::Integer(1))],
            vec![("a", Value::Integer(1)), ("b", Value::List(vec![]))],
        ]);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.resolve("b"), VarType::Sequence(Primitive::Int));
        assert_eq!(schema.capacity_hint("b"), Some(0));
    }

    #[test]
    fn test_last_numeric_value_is_kept() {
        let schema = schema_from(vec![
            vec![("step", Value::Integer(2))],
            vec![("step", Value::Integer(-1)), ("s", Value::String("x".to_string()))],
        ]);
        assert_eq!(schema.last_value("step"), Some(-1.0));
        assert_eq!(schema.last_value("s"), None);
        assert_eq!(schema.last_value("missing"), None);
    }
}
