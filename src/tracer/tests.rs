#[cfg(test)]
mod tests {
    use crate::interpreter::Value;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::tracer::{trace, Bindings, LineHook, SampledFunction, TraceFault, TypeTag};
    use std::collections::BTreeSet;

    fn trace_source(source: &str, step_limit: Option<u64>) -> crate::tracer::Observations {
        let module = parse(&tokenize(source).unwrap()).unwrap();
        let function = module.function("main").unwrap();
        trace(&SampledFunction::new(function).with_step_limit(step_limit))
    }

    #[test]
    fn test_records_type_tags_per_name() {
        let observations = trace_source("def main():\n    x = 1\n    x = 2.5\n    s = 'hi'\n", None);

        let x = observations.get("x").unwrap();
        assert_eq!(x.types, BTreeSet::from([TypeTag::Int, TypeTag::Float]));
        assert_eq!(x.last_scalar, Some(2.5));
        assert!(observations.get("s").unwrap().saw(TypeTag::Str));
        assert!(observations.is_complete());
    }

    #[test]
    fn test_last_assignment_is_observed_on_return() {
        let observations = trace_source("def main():\n    a = 1\n    b = 2\n", None);
        assert!(observations.get("b").is_some());
        assert_eq!(observations.statements, 2);
    }

    #[test]
    fn test_sequence_length_and_element_tags() {
        let source = "def main():\n    xs = [1, 2]\n    for i in range(4):\n        xs.append(i * 0.5)\n";
        let observations = trace_source(source, None);

        let xs = observations.get("xs").unwrap();
        assert_eq!(xs.max_len, Some(6));
        assert_eq!(xs.element_types, BTreeSet::from([TypeTag::Int, TypeTag::Float]));
        assert_eq!(xs.last_scalar, None);
    }

    #[test]
    fn test_runtime_fault_keeps_partial_observations() {
        let source = "def main():\n    a = 1\n    b = 2.5\n    c = a // 0\n    d = [1]\n";
        let observations = trace_source(source, None);

        assert!(observations.get("a").is_some());
        assert!(observations.get("b").is_some());
        assert!(observations.get("c").is_none());
        assert!(observations.get("d").is_none());
        assert!(observations.fault.as_deref().unwrap().contains("Division by zero"));
    }

    #[test]
    fn test_step_limit_is_contained() {
        let observations = trace_source("def main():\n    n = 0\n    while True:\n        n += 1\n", Some(100));

        assert_eq!(observations.statements, 100);
        assert!(observations.get("n").unwrap().saw(TypeTag::Int));
        assert!(observations.fault.unwrap().contains("step limit"));
    }

    #[test]
    fn test_scripted_closure_faulting_on_third_statement() {
        let scripted = |hook: &mut dyn LineHook| -> Result<(), TraceFault> {
            let mut locals = Bindings::new();
            hook.on_statement(&locals);
            locals.insert("a".to_string(), Value::Integer(1));
            hook.on_statement(&locals);
            locals.insert("b".to_string(), Value::Float(2.5));
            hook.on_statement(&locals);
            Err(TraceFault::Aborted("boom".to_string()))
        };

        let observations = trace(&scripted);

        assert_eq!(observations.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(observations.statements, 3);
        assert_eq!(observations.fault.as_deref(), Some("execution aborted: boom"));
    }

    #[test]
    fn test_tracing_is_deterministic() {
        let source = "def main():\n    xs = []\n    t = 0.0\n    for i in range(5):\n        xs.append(i)\n        t += i / 2\n";
        assert_eq!(trace_source(source, None), trace_source(source, None));
    }
}
