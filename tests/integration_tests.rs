use tracec::ast::{Expr, Literal, Statement};
use tracec::c_codegen::FallbackPolicy;
use tracec::interpreter::Value;
use tracec::schema::{Primitive, VarType};
use tracec::tracer::{Bindings, LineHook, TraceFault};
use tracec::{transpile, ExecutionEngine, ExecutionError, TranspileOptions};
use std::process::Command;

fn transpile_source(source: &str) -> tracec::Transpilation {
    ExecutionEngine::new().transpile_source(source).unwrap()
}

#[test]
fn test_counted_loop_sum() {
    let source = "def main():\n    n = 5\n    s = 0\n    for i in range(n):\n        s += i\n    print(s)\n\nif __name__ == '__main__':\n    main()\n";
    let result = transpile_source(source);

    let lines: Vec<&str> = result.c_code.lines().collect();
    assert_eq!(
        lines,
        vec![
            "#include <stdio.h>",
            "",
            "int main() {",
            "    int n = 5;",
            "    int s = 0;",
            "    for (int i = 0; i < n; i++) {",
            "        s += i;",
            "    }",
            "    printf(\"%d\\n\", s);",
            "    return 0;",
            "}",
        ]
    );
}

#[test]
fn test_list_literal_sizing() {
    let result = transpile_source("def main():\n    xs = [1, 2, 3]\n    print(xs[2])\n");

    assert_eq!(result.schema.resolve("xs"), VarType::Sequence(Primitive::Int));
    let declaration = result.c_code.find("List xs; list_init(&xs, sizeof(int), 3);").unwrap();
    let fill = result.c_code.find("{ int _tmp[] = {1, 2, 3};").unwrap();
    let size = result.c_code.find("xs.size = 3;").unwrap();
    assert!(declaration < fill && fill < size);
    assert!(result.c_code.contains("void list_init(List *l, int sz, int cap)"));
}

#[test]
fn test_fault_keeps_earlier_bindings() {
    let scripted = |hook: &mut dyn LineHook| -> Result<(), TraceFault> {
        let mut locals = Bindings::new();
        hook.on_statement(&locals);
        locals.insert("a".to_string(), Value::Integer(1));
        hook.on_statement(&locals);
        locals.insert("b".to_string(), Value::Float(0.5));
        hook.on_statement(&locals);
        Err(TraceFault::Aborted("third statement failed".to_string()))
    };
    let body = vec![
        Statement::Assign {
            target: Expr::Name("a".to_string()),
            value: Expr::Literal(Literal::Integer(1)),
        },
        Statement::Assign {
            target: Expr::Name("b".to_string()),
            value: Expr::Literal(Literal::Float(0.5)),
        },
        Statement::Assign {
            target: Expr::Name("c".to_string()),
            value: Expr::Literal(Literal::Integer(0)),
        },
    ];

    let result = transpile(&scripted, &body, FallbackPolicy::Placeholder).unwrap();

    assert_eq!(result.schema.len(), 2);
    assert_eq!(result.schema.resolve("b"), VarType::Float);
    assert!(result.c_code.contains("int a = 1;"));
    assert!(result.c_code.contains("double b = 0.5;"));
    assert!(result.c_code.contains("int c = 0;"));
    assert!(result.observations.fault.is_some());
}

#[test]
fn test_runtime_fault_in_sampled_function() {
    let source = "def main():\n    a = 1\n    b = 2.5\n    c = [a, b][5]\n    print(a, b)\n";
    let result = transpile_source(source);

    assert!(result.observations.fault.is_some());
    assert!(!result.schema.contains("c"));
    assert!(result.c_code.contains("int c = 0;"));
    assert!(result.c_code.contains("printf(\"%d %.2f\\n\", a, b);"));
}

#[test]
fn test_elif_chain() {
    let source = "def main():\n    x = 7\n    label = 0\n    if x < 3:\n        label = 1\n    elif x < 10:\n        label = 2\n    else:\n        label = 3\n    print(label)\n";
    let result = transpile_source(source);

    let expected = "    if ((x < 3)) {\n        label = 1;\n    } else if ((x < 10)) {\n        label = 2;\n    } else {\n        label = 3;\n    }\n";
    assert!(result.c_code.contains(expected));
}

#[test]
fn test_sequence_grown_by_append() {
    let source = "def main():\n    squares = []\n    i = 0\n    while i < 20:\n        squares.append(i * i)\n        i += 1\n    print(len(squares))\n";
    let result = transpile_source(source);

    assert!(result.c_code.contains("List squares; list_init(&squares, sizeof(int), 20);"));
    assert!(result.c_code.contains("squares.size = 0;"));
    assert!(result.c_code.contains("printf(\"%d\\n\", squares.size);"));
}

#[test]
fn test_mixed_program_features() {
    let source = "def main():\n    total = 0.0\n    name = 'sum'\n    for k in range(1, 4):\n        total += k ** 2\n    print(name, total)\n";
    let result = transpile_source(source);

    assert!(result.features.io && result.features.text && result.features.math);
    assert!(!result.features.alloc);
    assert!(result.c_code.starts_with("#include <stdio.h>\n#include <string.h>\n#include <math.h>\n\n"));
    assert!(result.c_code.contains("printf(\"%s %.2f\\n\", name, total);"));
}

#[test]
fn test_strict_policy_rejects_unsupported_constructs() {
    let engine = ExecutionEngine::with_options(TranspileOptions {
        policy: FallbackPolicy::Reject,
        ..TranspileOptions::default()
    });
    let result = engine.transpile_source("def main():\n    x = abs(-2)\n");

    assert!(matches!(result, Err(ExecutionError::CCodeGenError(_))));
}

#[test]
fn test_designated_function_option() {
    let engine = ExecutionEngine::with_options(TranspileOptions {
        function: "compute".to_string(),
        ..TranspileOptions::default()
    });
    let source = "def helper(x):\n    return x\n\ndef compute():\n    r = 1.5\n";
    let result = engine.transpile_source(source).unwrap();

    assert!(result.c_code.contains("double r = 1.5;"));
}

#[test]
fn test_output_is_deterministic() {
    let source = "def main():\n    xs = [3, 1, 2]\n    best = xs[0]\n    for i in range(len(xs)):\n        if xs[i] > best:\n            best = xs[i]\n    print(best)\n";
    assert_eq!(transpile_source(source).c_code, transpile_source(source).c_code);
}

fn gcc_available() -> bool {
    Command::new("gcc").arg("--version").output().is_ok_and(|o| o.status.success())
}

/// Builds `source` with gcc and returns what the program prints.
fn run_compiled(source: &str, name: &str) -> String {
    let module_name = format!("tracec_{}_{}", name, std::process::id());
    let executable = std::env::temp_dir().join(&module_name);
    ExecutionEngine::new()
        .compile_to_executable(source, &module_name, &executable)
        .unwrap();
    let output = Command::new(&executable).output().unwrap();
    let _ = std::fs::remove_file(&executable);
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_compiled_programs_match_python_output() {
    if !gcc_available() {
        eprintln!("gcc not found; skipping");
        return;
    }

    let counted = "def main():\n    n = 5\n    s = 0\n    for i in range(n):\n        s += i\n    print(s)\n";
    assert_eq!(run_compiled(counted, "counted"), "10\n");

    let literal = "def main():\n    xs = [1, 2, 3]\n    print(xs[2])\n";
    assert_eq!(run_compiled(literal, "literal"), "3\n");

    let counter_after_loop = "def main():\n    t = 0\n    for i in range(3):\n        t += i\n    print(i, t)\n";
    assert_eq!(run_compiled(counter_after_loop, "counter"), "2 3\n");

    let variable_step = "def main():\n    step = -1\n    c = 0\n    for k in range(5, 0, step):\n        c += 1\n    print(c)\n";
    assert_eq!(run_compiled(variable_step, "step"), "5\n");

    let appended = "def main():\n    squares = []\n    i = 0\n    while i < 4:\n        squares.append(i * i)\n        i += 1\n    print(squares[3], len(squares))\n";
    assert_eq!(run_compiled(appended, "append"), "9 4\n");
}

