use crate::Category;
use crate::Error;
use crate::code::{Code, Instruction, Operand, Register};
use crate::context::ExpressionContext;
use crate::symbols::Symbol;
use ast::{
    ArrayAccess, AssignmentExpression, BinaryOperator, BooleanExpression, CallExpression,
    LValue, Location, LogicalOperator, RelationalOperator, Spanned, SymbolType, UnaryOperator,
    ValueExpression, ValueType,
};
use std::rc::Rc;

/// Code that computes a value, and the symbol holding it afterwards.
pub(crate) type Evaluated = (Code, Rc<Symbol>);

pub(crate) trait EvaluateValue {
    fn evaluate(&self, ctx: &mut ExpressionContext) -> Result<Evaluated, Error>;
}

pub(crate) trait EvaluateCondition {
    /// Code that continues at `true_label` if the condition holds and at
    /// `false_label` otherwise.
    fn evaluate(
        &self,
        ctx: &mut ExpressionContext,
        true_label: &str,
        false_label: &str,
    ) -> Result<Code, Error>;
}

fn constant(value: i32, location: Location, ctx: &mut ExpressionContext) -> Evaluated {
    let result = ctx.new_temp(location);
    let mut code = Code::from(Instruction::LoadImmediate(Register::V0, value));
    code += result.save_value(Register::V0);
    (code, result)
}

fn arithmetic(operator: BinaryOperator, dst: Register, a: Register, b: Operand) -> Instruction {
    match operator {
        BinaryOperator::Add => Instruction::Add(dst, a, b),
        BinaryOperator::Subtract => Instruction::Sub(dst, a, b),
        BinaryOperator::Multiply => Instruction::Mul(dst, a, b),
        BinaryOperator::Divide => Instruction::Div(dst, a, b),
        BinaryOperator::And => Instruction::And(dst, a, b),
        BinaryOperator::Or => Instruction::Or(dst, a, b),
        BinaryOperator::Xor => Instruction::Xor(dst, a, b),
    }
}

fn branch(operator: RelationalOperator, a: Register, b: Operand, label: String) -> Instruction {
    match operator {
        RelationalOperator::Equal => Instruction::BranchEq(a, b, label),
        RelationalOperator::NotEqual => Instruction::BranchNe(a, b, label),
        RelationalOperator::Greater => Instruction::BranchGt(a, b, label),
        RelationalOperator::GreaterEqual => Instruction::BranchGe(a, b, label),
        RelationalOperator::Less => Instruction::BranchLt(a, b, label),
        RelationalOperator::LessEqual => Instruction::BranchLe(a, b, label),
    }
}

/// `char` values are kept zero-extended in registers and word cells.
pub(crate) fn truncate(ty: SymbolType, register: Register) -> Code {
    if ty == SymbolType::CHAR {
        Code::from(Instruction::And(register, register, 0xff.into()))
    } else {
        Code::new()
    }
}

/// Copies the current value of a variable into a temporary, so later
/// assignments to the variable do not change what the caller reads.
/// Temporaries and arrays are returned as they are.
fn snapshot(symbol: Rc<Symbol>, location: Location, ctx: &mut ExpressionContext) -> Evaluated {
    if symbol.is_temporary() || !symbol.ty.is_value() {
        return (Code::new(), symbol);
    }

    let copy = ctx.new_temp(location);
    let mut code = symbol.load_value(Register::V0);
    code += copy.save_value(Register::V0);

    let copy = Symbol {
        ty: symbol.ty,
        ..Symbol::clone(&copy)
    };
    (code, Rc::new(copy))
}

/// Evaluates operands left to right. A variable operand is read where it
/// appears when an operand after it may assign.
fn operands(
    expressions: &[&ValueExpression],
    ctx: &mut ExpressionContext,
) -> Result<(Code, Vec<Rc<Symbol>>), Error> {
    let mut code = Code::new();
    let mut symbols = Vec::with_capacity(expressions.len());

    for (i, expression) in expressions.iter().enumerate() {
        let (operand_code, mut symbol) = expression.evaluate(ctx)?;
        code += operand_code;

        if expressions[i + 1..].iter().any(|later| later.has_side_effects()) {
            let (copy_code, copy) = snapshot(symbol, expression.location(), ctx);
            code += copy_code;
            symbol = copy;
        }
        symbols.push(symbol);
    }

    Ok((code, symbols))
}

/// Resolves `name` to something that can be indexed.
fn indexable(
    name: &str,
    location: Location,
    ctx: &ExpressionContext,
) -> Result<(Rc<Symbol>, ValueType), Error> {
    let symbol = ctx.variable(name, location)?;
    match symbol.ty.element() {
        Some(element) => Ok((symbol, element)),
        None => Err(Error::NotIndexable(name.to_string(), location)),
    }
}

/// Traps through `$out_of_bounds_error` unless `index` is within the array.
/// Leaves the index in `$t0`.
fn bounds_check(
    array: &Symbol,
    index: &Symbol,
    index_expression: &ValueExpression,
    location: Location,
    ctx: &ExpressionContext,
) -> Code {
    let SymbolType::Array(_, size) = array.ty else {
        return Code::new();
    };

    if let Some(value) = index_expression.precomputable() {
        if value < 0 || value as u32 >= size {
            ctx.global().notice(
                location,
                Category::Warning,
                format!("array index {value} is out of bounds for \"{}\"", array.name),
            );
        }
    }

    let label = ctx.new_label();
    let out_of_bounds = format!("{label}_out_of_bounds");
    let in_bounds = format!("{label}_in_bounds");

    let mut code = comment!(ctx.global(), "bounds check {}[0..{size}]", array.name);
    code += index.load_value(Register::T0);
    code.extend([
        Instruction::BranchLtZero(Register::T0, out_of_bounds.clone()),
        Instruction::BranchGe(Register::T0, (size as i32).into(), out_of_bounds.clone()),
        Instruction::Branch(in_bounds.clone()),
        Instruction::Label(out_of_bounds),
        Instruction::Move(Register::A0, Register::T0),
        Instruction::JumpAndLink("$out_of_bounds_error".into()),
        Instruction::Label(in_bounds),
    ]);
    code
}

fn array_access(
    access: &Spanned<ArrayAccess>,
    ctx: &mut ExpressionContext,
) -> Result<Evaluated, Error> {
    let mut inner = ctx.clone();
    let (mut code, index) = access.index.evaluate(&mut inner)?;
    let (array, element) = indexable(&access.name, access.location, ctx)?;

    code += bounds_check(&array, &index, &access.index, access.location, ctx);

    let result = ctx.new_temp(access.location);
    code += index.load_value(Register::V1);
    code += array.load_element(element, Register::V1, Register::V0);
    code += result.save_value(Register::V0);

    Ok((code, result))
}

fn assignment(
    assignment: &Spanned<AssignmentExpression>,
    ctx: &mut ExpressionContext,
) -> Result<Evaluated, Error> {
    // The value is evaluated in `ctx` itself so its cell stays reserved for
    // whoever consumes the result.
    let (mut code, mut value) = assignment.value.evaluate(ctx)?;

    match &assignment.target {
        LValue::Variable(name) => {
            let target = ctx.variable(name, name.location)?;
            if !target.ty.is_value() {
                return Err(Error::NotAssignable(name.node.clone(), name.location));
            }

            code += value.load_value(Register::V0);
            code += truncate(target.ty, Register::V0);
            code += target.save_value(Register::V0);
        }
        LValue::ArrayAccess(access) => {
            if access.index.has_side_effects() {
                let (copy_code, copy) = snapshot(value, assignment.value.location(), ctx);
                code += copy_code;
                value = copy;
            }

            let mut inner = ctx.clone();
            let (index_code, index) = access.index.evaluate(&mut inner)?;
            let (array, element) = indexable(&access.name, access.location, ctx)?;

            code += index_code;
            code += bounds_check(&array, &index, &access.index, access.location, ctx);
            code += index.load_value(Register::V1);
            code += value.load_value(Register::V0);
            code += array.save_element(element, Register::V1, Register::V0);
        }
    }

    Ok((code, value))
}

/// Calls a function. The result is `None` for `void` functions.
pub(crate) fn call(
    call: &Spanned<CallExpression>,
    ctx: &mut ExpressionContext,
) -> Result<(Code, Option<Rc<Symbol>>), Error> {
    let function = ctx.function(&call.name, call.location)?;

    if call.arguments.len() > Register::ARGUMENTS.len() {
        return Err(Error::TooManyArguments(call.name.clone(), call.location));
    }
    if call.arguments.len() != function.parameters.len() {
        return Err(Error::ArgumentCount(
            call.name.clone(),
            function.parameters.len(),
            call.arguments.len(),
            call.location,
        ));
    }

    let mut inner = ctx.clone();
    let expressions: Vec<&ValueExpression> = call.arguments.iter().collect();
    let (mut code, arguments) = operands(&expressions, &mut inner)?;

    let passing = function.parameters.iter().zip(arguments.iter().zip(&call.arguments));
    for ((parameter, (argument, expression)), register) in passing.zip(Register::ARGUMENTS) {
        if !parameter.compatible_with(&argument.ty) {
            return Err(Error::IncompatibleArgument(
                call.name.clone(),
                *parameter,
                argument.ty,
                expression.location(),
            ));
        }
        code += argument.load_value(register);
        code += truncate(*parameter, register);
    }

    code += Instruction::JumpAndLink(function.label().to_string());

    if function.return_type == SymbolType::Void {
        return Ok((code, None));
    }

    let result = ctx.new_temp(call.location);
    code += result.save_value(Register::V0);

    Ok((code, Some(result)))
}

impl EvaluateValue for ValueExpression {
    fn evaluate(&self, ctx: &mut ExpressionContext) -> Result<Evaluated, Error> {
        if let Some(value) = self.precomputable() {
            return Ok(constant(value, self.location(), ctx));
        }

        match self {
            ValueExpression::Constant(value) => Ok(constant(value.node, value.location, ctx)),
            ValueExpression::Variable(name) => {
                Ok((Code::new(), ctx.variable(name, name.location)?))
            }
            ValueExpression::ArrayAccess(access) => array_access(access, ctx),
            ValueExpression::Unary(unary) => {
                let mut inner = ctx.clone();
                let (mut code, operand) = unary.operand.evaluate(&mut inner)?;
                let result = ctx.new_temp(unary.location);

                code += operand.load_value(Register::V0);
                code += match unary.operator {
                    UnaryOperator::Plus => Instruction::Move(Register::V0, Register::V0),
                    UnaryOperator::Minus => Instruction::Negate(Register::V0, Register::V0),
                    UnaryOperator::Complement => Instruction::Not(Register::V0, Register::V0),
                };
                code += result.save_value(Register::V0);

                Ok((code, result))
            }
            ValueExpression::Binary(binary) => {
                if binary.operator == BinaryOperator::Divide && binary.right.precomputable() == Some(0)
                {
                    ctx.global()
                        .notice(binary.location, Category::Warning, "divide by zero");
                }

                let mut inner = ctx.clone();
                let (mut code, values) =
                    operands(&[&*binary.left, &*binary.right], &mut inner)?;
                let result = ctx.new_temp(binary.location);

                code += values[0].load_value(Register::V0);
                code += values[1].load_value(Register::V1);
                code += arithmetic(binary.operator, Register::V0, Register::V0, Register::V1.into());
                code += result.save_value(Register::V0);

                Ok((code, result))
            }
            ValueExpression::Assignment(target) => assignment(target, ctx),
            ValueExpression::Call(expression) => match call(expression, ctx)? {
                (code, Some(result)) => Ok((code, result)),
                (_, None) => Err(Error::VoidValue(expression.name.clone(), expression.location)),
            },
            ValueExpression::Cast(condition) => {
                let label = ctx.new_label();
                let true_label = format!("{label}_true");
                let false_label = format!("{label}_false");
                let end_label = format!("{label}_end");

                let mut inner = ctx.clone();
                let mut code = condition.evaluate(&mut inner, &true_label, &false_label)?;
                let result = ctx.new_temp(condition.location());

                code.extend([
                    Instruction::Label(true_label),
                    Instruction::LoadImmediate(Register::V0, 1),
                    Instruction::Branch(end_label.clone()),
                    Instruction::Label(false_label),
                    Instruction::LoadImmediate(Register::V0, 0),
                    Instruction::Label(end_label),
                ]);
                code += result.save_value(Register::V0);

                Ok((code, result))
            }
        }
    }
}

impl EvaluateCondition for BooleanExpression {
    fn evaluate(
        &self,
        ctx: &mut ExpressionContext,
        true_label: &str,
        false_label: &str,
    ) -> Result<Code, Error> {
        match self {
            BooleanExpression::Not(operand) => operand.evaluate(ctx, false_label, true_label),
            BooleanExpression::Logical(logical) => {
                let label = ctx.new_label();
                let mut code = match logical.operator {
                    LogicalOperator::And => logical.left.evaluate(ctx, &label, false_label)?,
                    LogicalOperator::Or => logical.left.evaluate(ctx, true_label, &label)?,
                };
                code += Instruction::Label(label);
                code += logical.right.evaluate(ctx, true_label, false_label)?;
                Ok(code)
            }
            BooleanExpression::Relational(relational) => {
                if let (Some(left), Some(right)) = (
                    relational.left.precomputable(),
                    relational.right.precomputable(),
                ) {
                    let target = if relational.operator.compare(left, right) {
                        true_label
                    } else {
                        false_label
                    };
                    return Ok(Code::from(Instruction::Branch(target.to_string())));
                }

                let mut inner = ctx.clone();
                let (mut code, values) =
                    operands(&[&*relational.left, &*relational.right], &mut inner)?;

                code += values[0].load_value(Register::V0);
                code += values[1].load_value(Register::V1);
                code += branch(
                    relational.operator,
                    Register::V0,
                    Register::V1.into(),
                    true_label.to_string(),
                );
                code += Instruction::Branch(false_label.to_string());
                Ok(code)
            }
            BooleanExpression::Cast(value) => {
                if let Some(value) = value.precomputable() {
                    let target = if value != 0 { true_label } else { false_label };
                    return Ok(Code::from(Instruction::Branch(target.to_string())));
                }

                let mut inner = ctx.clone();
                let (mut code, symbol) = value.evaluate(&mut inner)?;
                code += symbol.load_value(Register::V0);
                code += Instruction::BranchNe(
                    Register::V0,
                    Register::Zero.into(),
                    true_label.to_string(),
                );
                code += Instruction::Branch(false_label.to_string());
                Ok(code)
            }
        }
    }
}
