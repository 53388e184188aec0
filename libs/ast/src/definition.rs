use crate::{Declaration, Expression, Location, Spanned, StatementBlock, SymbolType, ValueExpression};

/// Initial contents of a global variable.
#[derive(Debug, PartialEq, Clone)]
pub enum Initializer {
    Value(ValueExpression),
    Text(Spanned<String>),
}

impl Initializer {
    pub fn location(&self) -> Location {
        match self {
            Initializer::Value(value) => value.location(),
            Initializer::Text(text) => text.location,
        }
    }
}

impl From<Expression> for Initializer {
    fn from(expression: Expression) -> Self {
        Initializer::Value(expression.into_value())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: SymbolType,
    pub initializer: Option<Initializer>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: SymbolType,
    pub parameters: Vec<Spanned<Declaration>>,
    pub body: StatementBlock,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Definition {
    Field(Spanned<FieldDefinition>),
    Function(Spanned<FunctionDefinition>),
    /// The program entry point; never takes parameters.
    Main(Spanned<FunctionDefinition>),
}

impl Definition {
    pub fn field(
        name: impl Into<String>,
        ty: SymbolType,
        initializer: Option<Initializer>,
        location: Location,
    ) -> Self {
        Definition::Field(Spanned::new(
            FieldDefinition {
                name: name.into(),
                ty,
                initializer,
            },
            location,
        ))
    }

    pub fn function(
        name: impl Into<String>,
        return_type: SymbolType,
        parameters: Vec<Spanned<Declaration>>,
        body: StatementBlock,
        location: Location,
    ) -> Self {
        Definition::Function(Spanned::new(
            FunctionDefinition {
                name: name.into(),
                return_type,
                parameters,
                body,
            },
            location,
        ))
    }

    pub fn main(return_type: SymbolType, body: StatementBlock, location: Location) -> Self {
        Definition::Main(Spanned::new(
            FunctionDefinition {
                name: "main".into(),
                return_type,
                parameters: Vec::new(),
                body,
            },
            location,
        ))
    }

    pub fn name(&self) -> &str {
        match self {
            Definition::Field(field) => &field.name,
            Definition::Function(function) | Definition::Main(function) => &function.name,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Definition::Field(field) => field.location,
            Definition::Function(function) | Definition::Main(function) => function.location,
        }
    }
}

/// A whole compilation unit, definitions in source order.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Program {
    pub definitions: Vec<Definition>,
}

impl Program {
    pub fn new(definitions: Vec<Definition>) -> Self {
        Self { definitions }
    }
}
