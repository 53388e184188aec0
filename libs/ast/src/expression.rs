use crate::{Location, Spanned};
use std::str::FromStr;

/// Returned when an operator symbol has no meaning for the operator family
/// it was parsed as.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UnknownOperator(pub String);

impl std::fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid operator `{}`", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

/// Node constructors receive operator symbols straight from the grammar
/// actions, so a symbol outside the family is a bug in the tree builder.
fn operator<T: FromStr<Err = UnknownOperator>>(symbol: &str) -> T {
    match symbol.parse() {
        Ok(op) => op,
        Err(err) => panic!("{err}"),
    }
}

macro_rules! operators {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $symbol:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn symbol(&self) -> &'static str {
                match self {
                    $($name::$variant => $symbol),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOperator;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($symbol => Ok($name::$variant),)+
                    _ => Err(UnknownOperator(s.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.symbol())
            }
        }
    };
}

operators! {
    UnaryOperator {
        Plus => "+",
        Minus => "-",
        Complement => "~",
    }
}

operators! {
    BinaryOperator {
        Add => "+",
        Subtract => "-",
        Multiply => "*",
        Divide => "/",
        And => "&",
        Or => "|",
        Xor => "^",
    }
}

operators! {
    RelationalOperator {
        Equal => "==",
        NotEqual => "!=",
        Greater => ">",
        GreaterEqual => ">=",
        Less => "<",
        LessEqual => "<=",
    }
}

operators! {
    LogicalOperator {
        And => "&&",
        Or => "||",
    }
}

operators! {
    /// The only unary operator of the boolean family.
    NotOperator {
        Not => "!",
    }
}

impl UnaryOperator {
    /// Applies the operator with the target's 32-bit wrapping semantics.
    pub fn apply(self, value: u32) -> u32 {
        match self {
            UnaryOperator::Plus => value,
            UnaryOperator::Minus => value.wrapping_neg(),
            UnaryOperator::Complement => !value,
        }
    }
}

impl BinaryOperator {
    /// Applies the operator with the target's 32-bit wrapping semantics.
    /// Division is unsigned; dividing by zero has no value.
    pub fn apply(self, left: u32, right: u32) -> Option<u32> {
        Some(match self {
            BinaryOperator::Add => left.wrapping_add(right),
            BinaryOperator::Subtract => left.wrapping_sub(right),
            BinaryOperator::Multiply => left.wrapping_mul(right),
            BinaryOperator::Divide => left.checked_div(right)?,
            BinaryOperator::And => left & right,
            BinaryOperator::Or => left | right,
            BinaryOperator::Xor => left ^ right,
        })
    }
}

impl RelationalOperator {
    /// Signed comparison, as done by the branch instructions.
    pub fn compare(self, left: i32, right: i32) -> bool {
        match self {
            RelationalOperator::Equal => left == right,
            RelationalOperator::NotEqual => left != right,
            RelationalOperator::Greater => left > right,
            RelationalOperator::GreaterEqual => left >= right,
            RelationalOperator::Less => left < right,
            RelationalOperator::LessEqual => left <= right,
        }
    }
}

/// An expression as the grammar produces it, before it is placed where one
/// of the two families is required.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Value(ValueExpression),
    Boolean(BooleanExpression),
}

impl Expression {
    pub fn location(&self) -> Location {
        match self {
            Expression::Value(value) => value.location(),
            Expression::Boolean(boolean) => boolean.location(),
        }
    }

    /// Returns the expression as a value, wrapping conditions in a cast.
    pub fn into_value(self) -> ValueExpression {
        match self {
            Expression::Value(value) => value,
            Expression::Boolean(boolean) => ValueExpression::Cast(Box::new(boolean)),
        }
    }

    /// Returns the expression as a condition, wrapping values in a cast.
    pub fn into_boolean(self) -> BooleanExpression {
        match self {
            Expression::Value(value) => BooleanExpression::Cast(Box::new(value)),
            Expression::Boolean(boolean) => boolean,
        }
    }
}

impl From<ValueExpression> for Expression {
    fn from(value: ValueExpression) -> Self {
        Expression::Value(value)
    }
}

impl From<BooleanExpression> for Expression {
    fn from(boolean: BooleanExpression) -> Self {
        Expression::Boolean(boolean)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ArrayAccess {
    pub name: String,
    pub index: Box<ValueExpression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UnaryValueExpression {
    pub operator: UnaryOperator,
    pub operand: Box<ValueExpression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct BinaryValueExpression {
    pub operator: BinaryOperator,
    pub left: Box<ValueExpression>,
    pub right: Box<ValueExpression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct AssignmentExpression {
    pub target: LValue,
    pub value: Box<ValueExpression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CallExpression {
    pub name: String,
    pub arguments: Vec<ValueExpression>,
}

/// Expressions that leave their result in a storage cell.
#[derive(Debug, PartialEq, Clone)]
pub enum ValueExpression {
    Constant(Spanned<i32>),
    Variable(Spanned<String>),
    ArrayAccess(Spanned<ArrayAccess>),
    Unary(Spanned<UnaryValueExpression>),
    Binary(Spanned<BinaryValueExpression>),
    Assignment(Spanned<AssignmentExpression>),
    Call(Spanned<CallExpression>),
    /// A condition materialized as 1 or 0.
    Cast(Box<BooleanExpression>),
}

impl ValueExpression {
    pub fn constant(value: i32, location: Location) -> Self {
        ValueExpression::Constant(Spanned::new(value, location))
    }

    pub fn variable(name: impl Into<String>, location: Location) -> Self {
        ValueExpression::Variable(Spanned::new(name.into(), location))
    }

    pub fn array_access(name: impl Into<String>, index: Expression, location: Location) -> Self {
        ValueExpression::ArrayAccess(Spanned::new(
            ArrayAccess {
                name: name.into(),
                index: Box::new(index.into_value()),
            },
            location,
        ))
    }

    /// `operator_location` is the location of the operator token.
    pub fn unary(symbol: &str, operand: Expression, operator_location: Location) -> Self {
        let operand = operand.into_value();
        let location = operator_location + operand.location();

        ValueExpression::Unary(Spanned::new(
            UnaryValueExpression {
                operator: operator(symbol),
                operand: Box::new(operand),
            },
            location,
        ))
    }

    pub fn binary(symbol: &str, left: Expression, right: Expression) -> Self {
        let left = left.into_value();
        let right = right.into_value();
        let location = left.location() + right.location();

        ValueExpression::Binary(Spanned::new(
            BinaryValueExpression {
                operator: operator(symbol),
                left: Box::new(left),
                right: Box::new(right),
            },
            location,
        ))
    }

    pub fn assignment(target: LValue, value: Expression) -> Self {
        let value = value.into_value();
        let location = target.location() + value.location();

        ValueExpression::Assignment(Spanned::new(
            AssignmentExpression {
                target,
                value: Box::new(value),
            },
            location,
        ))
    }

    pub fn call(name: impl Into<String>, arguments: Vec<Expression>, location: Location) -> Self {
        ValueExpression::Call(Spanned::new(
            CallExpression {
                name: name.into(),
                arguments: arguments.into_iter().map(Expression::into_value).collect(),
            },
            location,
        ))
    }

    pub fn location(&self) -> Location {
        match self {
            ValueExpression::Constant(e) => e.location,
            ValueExpression::Variable(e) => e.location,
            ValueExpression::ArrayAccess(e) => e.location,
            ValueExpression::Unary(e) => e.location,
            ValueExpression::Binary(e) => e.location,
            ValueExpression::Assignment(e) => e.location,
            ValueExpression::Call(e) => e.location,
            ValueExpression::Cast(e) => e.location(),
        }
    }

    /// The value of the expression if it can be computed at compile time.
    pub fn precomputable(&self) -> Option<i32> {
        match self {
            ValueExpression::Constant(constant) => Some(constant.node),
            ValueExpression::Unary(unary) => {
                let operand = unary.operand.precomputable()?;
                Some(unary.operator.apply(operand as u32) as i32)
            }
            ValueExpression::Binary(binary) => {
                let left = binary.left.precomputable()?;
                let right = binary.right.precomputable()?;
                binary
                    .operator
                    .apply(left as u32, right as u32)
                    .map(|value| value as i32)
            }
            _ => None,
        }
    }

    /// Whether evaluating the expression may change a variable, that is, it
    /// contains an assignment or a call.
    pub fn has_side_effects(&self) -> bool {
        match self {
            ValueExpression::Constant(_) | ValueExpression::Variable(_) => false,
            ValueExpression::Assignment(_) | ValueExpression::Call(_) => true,
            ValueExpression::ArrayAccess(access) => access.index.has_side_effects(),
            ValueExpression::Unary(unary) => unary.operand.has_side_effects(),
            ValueExpression::Binary(binary) => {
                binary.left.has_side_effects() || binary.right.has_side_effects()
            }
            ValueExpression::Cast(condition) => condition.has_side_effects(),
        }
    }
}

/// The target of an assignment.
#[derive(Debug, PartialEq, Clone)]
pub enum LValue {
    Variable(Spanned<String>),
    ArrayAccess(Spanned<ArrayAccess>),
}

impl LValue {
    pub fn variable(name: impl Into<String>, location: Location) -> Self {
        LValue::Variable(Spanned::new(name.into(), location))
    }

    pub fn array_access(name: impl Into<String>, index: Expression, location: Location) -> Self {
        LValue::ArrayAccess(Spanned::new(
            ArrayAccess {
                name: name.into(),
                index: Box::new(index.into_value()),
            },
            location,
        ))
    }

    pub fn name(&self) -> &str {
        match self {
            LValue::Variable(name) => name,
            LValue::ArrayAccess(access) => &access.name,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            LValue::Variable(e) => e.location,
            LValue::ArrayAccess(e) => e.location,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<BooleanExpression>,
    pub right: Box<BooleanExpression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RelationalExpression {
    pub operator: RelationalOperator,
    pub left: Box<ValueExpression>,
    pub right: Box<ValueExpression>,
}

/// Expressions that branch to one of two labels instead of producing a value.
#[derive(Debug, PartialEq, Clone)]
pub enum BooleanExpression {
    Not(Spanned<Box<BooleanExpression>>),
    Logical(Spanned<LogicalExpression>),
    Relational(Spanned<RelationalExpression>),
    /// A value tested against zero.
    Cast(Box<ValueExpression>),
}

impl BooleanExpression {
    /// `operator_location` is the location of the operator token.
    pub fn unary(symbol: &str, operand: Expression, operator_location: Location) -> Self {
        let NotOperator::Not = operator::<NotOperator>(symbol);
        let operand = operand.into_boolean();
        let location = operator_location + operand.location();

        BooleanExpression::Not(Spanned::new(Box::new(operand), location))
    }

    pub fn binary(symbol: &str, left: Expression, right: Expression) -> Self {
        let left = left.into_boolean();
        let right = right.into_boolean();
        let location = left.location() + right.location();

        BooleanExpression::Logical(Spanned::new(
            LogicalExpression {
                operator: operator(symbol),
                left: Box::new(left),
                right: Box::new(right),
            },
            location,
        ))
    }

    pub fn relational(symbol: &str, left: Expression, right: Expression) -> Self {
        let left = left.into_value();
        let right = right.into_value();
        let location = left.location() + right.location();

        BooleanExpression::Relational(Spanned::new(
            RelationalExpression {
                operator: operator(symbol),
                left: Box::new(left),
                right: Box::new(right),
            },
            location,
        ))
    }

    pub fn location(&self) -> Location {
        match self {
            BooleanExpression::Not(e) => e.location,
            BooleanExpression::Logical(e) => e.location,
            BooleanExpression::Relational(e) => e.location,
            BooleanExpression::Cast(e) => e.location(),
        }
    }

    pub fn has_side_effects(&self) -> bool {
        match self {
            BooleanExpression::Not(operand) => operand.has_side_effects(),
            BooleanExpression::Logical(logical) => {
                logical.left.has_side_effects() || logical.right.has_side_effects()
            }
            BooleanExpression::Relational(relational) => {
                relational.left.has_side_effects() || relational.right.has_side_effects()
            }
            BooleanExpression::Cast(value) => value.has_side_effects(),
        }
    }
}
