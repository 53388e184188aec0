use ast::*;

#[macro_export]
macro_rules! compile {
    ($program:expr) => {{
        crate::Compiler::new(None).compile(&$program)?.to_string()
    }};

    (debug $program:expr) => {{
        let config = crate::CompilerConfig {
            debug: true,
            ..Default::default()
        };
        crate::Compiler::new(Some(config))
            .compile(&$program)?
            .to_string()
    }};

    (error $program:expr) => {{
        crate::Compiler::new(None)
            .compile(&$program)
            .expect_err("compilation should fail")
    }};

    (notices $program:expr) => {{
        let mut notices = Vec::new();
        let result = crate::Compiler::new(None)
            .with_notices(|location: &ast::Location, category: crate::Category, message: &str| {
                notices.push(crate::Notice {
                    location: *location,
                    category,
                    message: message.to_string(),
                })
            })
            .compile(&$program);
        (result, notices)
    }};
}


fn at(line: usize, col: usize) -> Location {
    Location::line(line, col, col)
}

fn num(value: i32) -> Expression {
    ValueExpression::constant(value, Location::default()).into()
}

fn var(name: &str) -> Expression {
    ValueExpression::variable(name, Location::default()).into()
}

fn bin(op: &str, left: Expression, right: Expression) -> Expression {
    ValueExpression::binary(op, left, right).into()
}

fn rel(op: &str, left: Expression, right: Expression) -> Expression {
    BooleanExpression::relational(op, left, right).into()
}

fn logic(op: &str, left: Expression, right: Expression) -> Expression {
    BooleanExpression::binary(op, left, right).into()
}

fn index(name: &str, index: Expression) -> Expression {
    ValueExpression::array_access(name, index, Location::default()).into()
}

fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    ValueExpression::call(name, arguments, Location::default()).into()
}

fn assign(name: &str, value: Expression) -> Statement {
    Statement::expression(ValueExpression::assignment(
        LValue::variable(name, Location::default()),
        value,
    ))
}

fn assign_element(name: &str, index: Expression, value: Expression) -> Statement {
    Statement::expression(ValueExpression::assignment(
        LValue::array_access(name, index, Location::default()),
        value,
    ))
}

fn declare(name: &str, ty: SymbolType) -> Statement {
    Statement::declaration(name, ty, Location::default())
}

fn block(statements: Vec<Statement>) -> StatementBlock {
    StatementBlock::new(statements, Location::default())
}

fn void_main(statements: Vec<Statement>) -> Program {
    Program::new(vec![Definition::main(
        SymbolType::Void,
        block(statements),
        Location::default(),
    )])
}
