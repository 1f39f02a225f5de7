#[cfg(test)]
mod tests {
    use crate::interpreter::{Environment, Interpreter, InterpreterError, Value};
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::tracer::{Bindings, LineHook};

    #[derive(Default)]
    struct Recorder {
        snapshots: Vec<Bindings>,
        returned: Option<Bindings>,
    }

    impl LineHook for Recorder {
        fn on_statement(&mut self, locals: &Bindings) {
            self.snapshots.push(locals.clone());
        }

        fn on_return(&mut self, locals: &Bindings) {
            self.returned = Some(locals.clone());
        }
    }

    fn run(source: &str) -> (Result<Value, InterpreterError>, Environment, Vec<String>, Recorder) {
        let module = parse(&tokenize(source).unwrap()).unwrap();
        let function = module.function("main").unwrap();
        let mut recorder = Recorder::default();
        let mut env = Environment::new();
        let (result, output) = {
            let mut interpreter = Interpreter::new(&mut recorder);
            let result = interpreter.execute_function(function, &mut env);
            (result, interpreter.output().to_vec())
        };
        (result, env, output, recorder)
    }

    fn var(env: &Environment, name: &str) -> Value {
        env.get_variable(name).unwrap()
    }

    #[test]
    fn test_simple_arithmetic() {
        let (result, env, _, _) = run("def main():\n    x = 5\n    y = x * 2 + 1\n    return y\n");
        assert_eq!(result.unwrap(), Value::Integer(11));
        assert_eq!(var(&env, "y"), Value::Integer(11));
    }

    #[test]
    fn test_python_division_semantics() {
        let source = "def main():\n    a = 7 / 2\n    b = -7 // 2\n    c = -7 % 3\n    d = 2 ** 10\n    e = 2 ** -1\n    f = 7.5 // 2\n";
        let (result, env, _, _) = run(source);
        assert!(result.is_ok());
        assert_eq!(var(&env, "a"), Value::Float(3.5));
        assert_eq!(var(&env, "b"), Value::Integer(-4));
        assert_eq!(var(&env, "c"), Value::Integer(2));
        assert_eq!(var(&env, "d"), Value::Integer(1024));
        assert_eq!(var(&env, "e"), Value::Float(0.5));
        assert_eq!(var(&env, "f"), Value::Float(3.0));
    }

    #[test]
    fn test_hook_sees_bindings_before_each_statement() {
        let (_, _, _, recorder) = run("def main():\n    a = 1\n    b = 2.5\n");

        assert_eq!(recorder.snapshots.len(), 2);
        assert!(recorder.snapshots[0].is_empty());
        assert_eq!(recorder.snapshots[1].get("a"), Some(&Value::Integer(1)));

        let returned = recorder.returned.unwrap();
        assert_eq!(returned.get("b"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_loops_break_and_continue() {
        let source = "def main():\n    s = 0\n    for i in range(10):\n        if i % 2 == 0:\n            continue\n        if i > 7:\n            break\n        s += i\n    n = 0\n    while n < 3:\n        n += 1\n";
        let (result, env, _, _) = run(source);
        assert!(result.is_ok());
        assert_eq!(var(&env, "s"), Value::Integer(1 + 3 + 5 + 7));
        assert_eq!(var(&env, "i"), Value::Integer(9));
        assert_eq!(var(&env, "n"), Value::Integer(3));
    }

    #[test]
    fn test_range_with_negative_step() {
        let (_, env, _, _) = run("def main():\n    xs = []\n    for i in range(5, 0, -2):\n        xs.append(i)\n");
        assert_eq!(
            var(&env, "xs"),
            Value::List(vec![Value::Integer(5), Value::Integer(3), Value::Integer(1)])
        );
    }

    #[test]
    fn test_lists_and_indexing() {
        let source = "def main():\n    xs = [1, 2, 3]\n    xs[0] = 10\n    xs.append(4)\n    last = xs[-1]\n    n = len(xs)\n    t = 0\n    for x in xs:\n        t += x\n";
        let (result, env, _, _) = run(source);
        assert!(result.is_ok());
        assert_eq!(var(&env, "last"), Value::Integer(4));
        assert_eq!(var(&env, "n"), Value::Integer(4));
        assert_eq!(var(&env, "t"), Value::Integer(19));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let (result, _, _, _) = run("def main():\n    xs = [1]\n    y = xs[3]\n");
        assert!(matches!(
            result,
            Err(InterpreterError::IndexOutOfBounds { index: 3, length: 1 })
        ));
    }

    #[test]
    fn test_print_is_captured() {
        let (_, _, output, _) = run("def main():\n    x = 2.0\n    print('x is', x, True, [1, 'a'])\n");
        assert_eq!(output, vec!["x is 2.0 True [1, 'a']".to_string()]);
    }

    #[test]
    fn test_builtins() {
        let source = "def main():\n    a = abs(-3)\n    b = max(1, 7, 3)\n    c = min([4, 2, 9])\n    d = int(3.9)\n    e = float('1.5')\n    f = str(12)\n";
        let (result, env, _, _) = run(source);
        assert!(result.is_ok());
        assert_eq!(var(&env, "a"), Value::Integer(3));
        assert_eq!(var(&env, "b"), Value::Integer(7));
        assert_eq!(var(&env, "c"), Value::Integer(2));
        assert_eq!(var(&env, "d"), Value::Integer(3));
        assert_eq!(var(&env, "e"), Value::Float(1.5));
        assert_eq!(var(&env, "f"), Value::String("12".to_string()));
    }

    #[test]
    fn test_chained_comparison_and_short_circuit() {
        let source = "def main():\n    x = 5\n    a = 0 < x <= 5\n    b = 3 < x < 4\n    c = 0 or 'fallback'\n    d = x > 10 and undefined\n";
        let (result, env, _, _) = run(source);
        assert!(result.is_ok());
        assert_eq!(var(&env, "a"), Value::Boolean(true));
        assert_eq!(var(&env, "b"), Value::Boolean(false));
        assert_eq!(var(&env, "c"), Value::String("fallback".to_string()));
        assert_eq!(var(&env, "d"), Value::Boolean(false));
    }

    #[test]
    fn test_division_by_zero_is_a_fault() {
        let (result, env, _, recorder) = run("def main():\n    a = 1\n    b = a // 0\n");
        assert!(matches!(result, Err(InterpreterError::DivisionByZero)));
        assert!(env.get_variable("b").is_err());
        assert!(recorder.returned.is_none());
    }

    #[test]
    fn test_step_limit() {
        let module = parse(&tokenize("def main():\n    while True:\n        pass\n").unwrap()).unwrap();
        let function = module.function("main").unwrap();
        let mut recorder = Recorder::default();
        let mut env = Environment::new();
        let mut interpreter = Interpreter::new(&mut recorder).with_step_limit(Some(50));

        let result = interpreter.execute_function(function, &mut env);
        assert!(matches!(result, Err(InterpreterError::StepLimitExceeded { limit: 50 })));
        assert_eq!(interpreter.steps(), 50);
    }

    #[test]
    fn test_unknown_function() {
        let (result, _, _, _) = run("def main():\n    x = helper()\n");
        assert!(matches!(result, Err(InterpreterError::FunctionNotFound { .. })));
    }
}
