use crate::*;


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

fn unary(op: &str, operand: Expression) -> Expression {
    ValueExpression::unary(op, operand, Location::default()).into()
}

fn rel(op: &str, left: Expression, right: Expression) -> Expression {
    BooleanExpression::relational(op, left, right).into()
}

fn block(statements: Vec<Statement>) -> StatementBlock {
    StatementBlock::new(statements, Location::default())
}
