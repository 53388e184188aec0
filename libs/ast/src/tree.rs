use crate::*;

const INDENT: usize = 2;

fn line(indent: usize, text: impl std::fmt::Display) -> String {
    format!("{:indent$}{text}\n", "")
}

/// Indented, line-per-node rendering of a subtree, for inspecting what the
/// tree holds.
pub trait Tree {
    fn tree(&self, indent: usize) -> String;

    fn dump(&self) -> String {
        self.tree(0)
    }
}

impl<T: Tree> Tree for Box<T> {
    fn tree(&self, indent: usize) -> String {
        (**self).tree(indent)
    }
}

impl<T: Tree> Tree for [T] {
    fn tree(&self, indent: usize) -> String {
        self.iter().map(|node| node.tree(indent)).collect()
    }
}

impl Tree for Expression {
    fn tree(&self, indent: usize) -> String {
        match self {
            Expression::Value(value) => value.tree(indent),
            Expression::Boolean(boolean) => boolean.tree(indent),
        }
    }
}

impl Tree for ArrayAccess {
    fn tree(&self, indent: usize) -> String {
        line(indent, format!("{}[ ]", self.name)) + &self.index.tree(indent + INDENT)
    }
}

impl Tree for LValue {
    fn tree(&self, indent: usize) -> String {
        match self {
            LValue::Variable(name) => line(indent, name),
            LValue::ArrayAccess(access) => access.tree(indent),
        }
    }
}

impl Tree for ValueExpression {
    fn tree(&self, indent: usize) -> String {
        let inner = indent + INDENT;

        match self {
            ValueExpression::Constant(value) => line(indent, value),
            ValueExpression::Variable(name) => line(indent, name),
            ValueExpression::ArrayAccess(access) => access.tree(indent),
            ValueExpression::Unary(unary) => {
                line(indent, format!("unary operator {}", unary.operator))
                    + &unary.operand.tree(inner)
            }
            ValueExpression::Binary(binary) => {
                line(indent, format!("binary operator {}", binary.operator))
                    + &binary.left.tree(inner)
                    + &binary.right.tree(inner)
            }
            ValueExpression::Assignment(assignment) => {
                line(indent, "assignment =")
                    + &assignment.target.tree(inner)
                    + &assignment.value.tree(inner)
            }
            ValueExpression::Call(call) => {
                line(indent, format!("call {}", call.name)) + &call.arguments.tree(inner)
            }
            ValueExpression::Cast(boolean) => line(indent, "cast to value") + &boolean.tree(inner),
        }
    }
}

impl Tree for BooleanExpression {
    fn tree(&self, indent: usize) -> String {
        let inner = indent + INDENT;

        match self {
            BooleanExpression::Not(operand) => {
                line(indent, "unary operator !") + &operand.node.tree(inner)
            }
            BooleanExpression::Logical(logical) => {
                line(indent, format!("binary operator {}", logical.operator))
                    + &logical.left.tree(inner)
                    + &logical.right.tree(inner)
            }
            BooleanExpression::Relational(relational) => {
                line(indent, format!("relational operator {}", relational.operator))
                    + &relational.left.tree(inner)
                    + &relational.right.tree(inner)
            }
            BooleanExpression::Cast(value) => line(indent, "cast to bool") + &value.tree(inner),
        }
    }
}

impl Tree for Declaration {
    fn tree(&self, indent: usize) -> String {
        line(indent, format!("{} : {}", self.name, self.ty))
    }
}

impl<T: Tree> Tree for Spanned<T> {
    fn tree(&self, indent: usize) -> String {
        self.node.tree(indent)
    }
}

impl Tree for StatementBlock {
    fn tree(&self, indent: usize) -> String {
        line(indent, "block") + &self.statements.tree(indent + INDENT)
    }
}

impl Tree for SwitchCase {
    fn tree(&self, indent: usize) -> String {
        let inner = indent + INDENT;
        let mut out = match &self.label {
            CaseLabel::Value(value) => {
                line(indent, "case") + &line(inner, "value") + &value.tree(inner + INDENT)
            }
            CaseLabel::Default => line(indent, "default"),
        };
        out += &line(inner, "do");
        out += &self.body.tree(inner + INDENT);
        out
    }
}

impl Tree for Statement {
    fn tree(&self, indent: usize) -> String {
        let inner = indent + INDENT;
        let nested = inner + INDENT;

        match self {
            Statement::Declaration(declaration) => declaration.tree(indent),
            Statement::Expression(expression) => expression.tree(indent),
            Statement::Block(block) => block.tree(indent),
            Statement::IfElse(statement) => {
                line(indent, "if")
                    + &line(inner, "condition")
                    + &statement.condition.tree(nested)
                    + &line(inner, "then")
                    + &statement.then_block.tree(nested)
                    + &line(inner, "else")
                    + &statement.else_block.tree(nested)
            }
            Statement::While(statement) => {
                line(indent, "while")
                    + &line(inner, "condition")
                    + &statement.condition.tree(nested)
                    + &line(inner, "do")
                    + &statement.body.tree(nested)
            }
            Statement::For(statement) => {
                line(indent, "for")
                    + &line(inner, "init")
                    + &statement.initializer.tree(nested)
                    + &line(inner, "condition")
                    + &statement.condition.tree(nested)
                    + &line(inner, "step")
                    + &statement.step.tree(nested)
                    + &line(inner, "do")
                    + &statement.body.tree(nested)
            }
            Statement::Switch(statement) => {
                line(indent, "switch")
                    + &line(inner, "on")
                    + &statement.subject.tree(nested)
                    + &statement.cases.tree(inner)
            }
            Statement::Break(_) => line(indent, "break"),
            Statement::Continue(_) => line(indent, "continue"),
            Statement::Return(value) => {
                let mut out = line(indent, "return");
                if let Some(value) = &value.node {
                    out += &value.tree(inner);
                }
                out
            }
        }
    }
}

impl Tree for FunctionDefinition {
    fn tree(&self, indent: usize) -> String {
        let inner = indent + INDENT;

        line(indent, format!("function {} : {}", self.name, self.return_type))
            + &line(inner, "parameters")
            + &self.parameters.tree(inner + INDENT)
            + &line(inner, "body")
            + &self.body.tree(inner + INDENT)
    }
}

impl Tree for Definition {
    fn tree(&self, indent: usize) -> String {
        match self {
            Definition::Field(field) => {
                let mut out = line(indent, format!("variable {} : {}", field.name, field.ty));
                match &field.initializer {
                    Some(Initializer::Value(value)) => out += &value.tree(indent + INDENT),
                    Some(Initializer::Text(text)) => {
                        out += &line(indent + INDENT, format!("{:?}", text.node))
                    }
                    None => {}
                }
                out
            }
            Definition::Function(function) | Definition::Main(function) => function.tree(indent),
        }
    }
}

impl Tree for Program {
    fn tree(&self, indent: usize) -> String {
        line(indent, "program") + &self.definitions.tree(indent + INDENT)
    }
}
