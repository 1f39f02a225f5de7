use std::fmt;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Module {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum Item {
    Function(FunctionDef),
    Import { module: String },
    Statement(Statement),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
    pub line: usize,
}

impl Module {
    /// Finds a top-level function definition by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.items.iter().find_map(|item| match item {
            Item::Function(def) if def.name == name => Some(def),
            _ => None,
        })
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Function(def) => Some(def.name.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum Statement {
    /// `target = value`; the target is a name or a subscript.
    Assign {
        target: Expr,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        operator: BinaryOperator,
        value: Expr,
    },
    If {
        test: Expr,
        body: Vec<Statement>,
        orelse: Vec<Statement>,
    },
    For {
        target: String,
        iter: Expr,
        body: Vec<Statement>,
    },
    While {
        test: Expr,
        body: Vec<Statement>,
    },
    Break,
    Continue,
    Pass,
    Return {
        value: Option<Expr>,
    },
    Expression(Expr),
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum Expr {
    Name(String),
    Literal(Literal),
    Binary {
        left: Box<Expr>,
        operator: BinaryOperator,
        right: Box<Expr>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        operators: Vec<CompareOperator>,
        comparators: Vec<Expr>,
    },
    BoolOp {
        operator: BoolOperator,
        values: Vec<Expr>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        arguments: Vec<Expr>,
    },
    List {
        elements: Vec<Expr>,
    },
}

impl Expr {
    /// Returns the callee name when this is a call to a plain identifier.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Expr::Call { callee, .. } => match callee.as_ref() {
                Expr::Name(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CompareOperator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BoolOperator {
    And,
    Or,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::FloorDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOperator::Less => "<",
            CompareOperator::LessEqual => "<=",
            CompareOperator::Greater => ">",
            CompareOperator::GreaterEqual => ">=",
            CompareOperator::Equal => "==",
            CompareOperator::NotEqual => "!=",
        };
        write!(f, "{}", symbol)
    }
}
