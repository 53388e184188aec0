use crate::{BooleanExpression, Error, Expression, Location, Spanned, SymbolType, ValueExpression};

/// `name : type`, used for local variables and parameters alike.
#[derive(Debug, PartialEq, Clone)]
pub struct Declaration {
    pub name: String,
    pub ty: SymbolType,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StatementBlock {
    pub location: Location,
    pub statements: Vec<Statement>,
}

impl StatementBlock {
    pub fn new(statements: Vec<Statement>, location: Location) -> Self {
        Self {
            location,
            statements,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct IfElseStatement {
    pub condition: BooleanExpression,
    pub then_block: StatementBlock,
    pub else_block: StatementBlock,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WhileStatement {
    pub condition: BooleanExpression,
    pub body: StatementBlock,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ForStatement {
    pub initializer: Vec<Statement>,
    pub condition: BooleanExpression,
    pub step: Expression,
    pub body: StatementBlock,
}

#[derive(Debug, PartialEq, Clone)]
pub enum CaseLabel {
    Value(ValueExpression),
    Default,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SwitchCase {
    pub location: Location,
    pub label: CaseLabel,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SwitchStatement {
    pub subject: ValueExpression,
    pub cases: Vec<SwitchCase>,
}

impl SwitchStatement {
    /// An empty switch, filled case by case while the body is parsed.
    pub fn new(subject: Expression) -> Self {
        Self {
            subject: subject.into_value(),
            cases: Vec::new(),
        }
    }

    pub fn add_case(&mut self, value: Expression, location: Location) {
        self.cases.push(SwitchCase {
            location,
            label: CaseLabel::Value(value.into_value()),
            body: Vec::new(),
        });
    }

    pub fn add_default_case(&mut self, location: Location) -> Result<(), Error> {
        if self.default_case().is_some() {
            return Err(Error::DuplicateDefault(location));
        }

        self.cases.push(SwitchCase {
            location,
            label: CaseLabel::Default,
            body: Vec::new(),
        });

        Ok(())
    }

    /// Appends a statement to the most recently added case.
    pub fn add_statement(&mut self, statement: Statement) -> Result<(), Error> {
        match self.cases.last_mut() {
            Some(case) => {
                case.body.push(statement);
                Ok(())
            }
            None => Err(Error::StatementOutsideCase(statement.location())),
        }
    }

    pub fn default_case(&self) -> Option<usize> {
        self.cases
            .iter()
            .position(|case| case.label == CaseLabel::Default)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Declaration(Spanned<Declaration>),
    /// An expression evaluated for its side effects.
    Expression(Expression),
    Block(StatementBlock),
    IfElse(Spanned<IfElseStatement>),
    While(Spanned<WhileStatement>),
    For(Spanned<ForStatement>),
    Switch(Spanned<SwitchStatement>),
    Break(Location),
    Continue(Location),
    Return(Spanned<Option<ValueExpression>>),
}

impl Statement {
    pub fn declaration(name: impl Into<String>, ty: SymbolType, location: Location) -> Self {
        Statement::Declaration(Spanned::new(
            Declaration {
                name: name.into(),
                ty,
            },
            location,
        ))
    }

    pub fn expression(expression: impl Into<Expression>) -> Self {
        Statement::Expression(expression.into())
    }

    pub fn if_else(
        condition: Expression,
        then_block: StatementBlock,
        else_block: Option<StatementBlock>,
        location: Location,
    ) -> Self {
        let else_block =
            else_block.unwrap_or_else(|| StatementBlock::new(Vec::new(), then_block.location));

        Statement::IfElse(Spanned::new(
            IfElseStatement {
                condition: condition.into_boolean(),
                then_block,
                else_block,
            },
            location,
        ))
    }

    pub fn while_loop(condition: Expression, body: StatementBlock, location: Location) -> Self {
        Statement::While(Spanned::new(
            WhileStatement {
                condition: condition.into_boolean(),
                body,
            },
            location,
        ))
    }

    pub fn for_loop(
        initializer: Vec<Statement>,
        condition: Expression,
        step: Expression,
        body: StatementBlock,
        location: Location,
    ) -> Self {
        Statement::For(Spanned::new(
            ForStatement {
                initializer,
                condition: condition.into_boolean(),
                step,
                body,
            },
            location,
        ))
    }

    pub fn switch(switch: SwitchStatement, location: Location) -> Self {
        Statement::Switch(Spanned::new(switch, location))
    }

    pub fn return_value(value: Option<Expression>, location: Location) -> Self {
        Statement::Return(Spanned::new(value.map(Expression::into_value), location))
    }

    pub fn location(&self) -> Location {
        match self {
            Statement::Declaration(s) => s.location,
            Statement::Expression(e) => e.location(),
            Statement::Block(b) => b.location,
            Statement::IfElse(s) => s.location,
            Statement::While(s) => s.location,
            Statement::For(s) => s.location,
            Statement::Switch(s) => s.location,
            Statement::Break(location) | Statement::Continue(location) => *location,
            Statement::Return(s) => s.location,
        }
    }
}
