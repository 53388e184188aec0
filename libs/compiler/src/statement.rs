use crate::Error;
use crate::code::{Code, Instruction, Register};
use crate::context::{ExpressionContext, LocalContext};
use crate::expression::{EvaluateCondition, EvaluateValue, call, truncate};
use ast::{
    CaseLabel, Expression, ForStatement, IfElseStatement, Spanned, Statement, StatementBlock,
    SwitchStatement, ValueExpression, WhileStatement,
};
use std::collections::HashSet;

pub(crate) trait Compile {
    fn compile(&self, ctx: &mut LocalContext) -> Result<Code, Error>;
}

impl<T: Compile> Compile for [T] {
    fn compile(&self, ctx: &mut LocalContext) -> Result<Code, Error> {
        let mut code = Code::new();
        for statement in self {
            code += statement.compile(ctx)?;
        }
        Ok(code)
    }
}

impl Compile for StatementBlock {
    fn compile(&self, ctx: &mut LocalContext) -> Result<Code, Error> {
        let mut scope = LocalContext::scoped(ctx);
        self.statements.compile(&mut scope)
    }
}

/// Evaluates an expression only for its side effects.
fn discard(expression: &Expression, ctx: &LocalContext) -> Result<Code, Error> {
    let mut exp = ExpressionContext::new(ctx);

    match expression {
        // The only value expression allowed to produce nothing.
        Expression::Value(ValueExpression::Call(expression)) => Ok(call(expression, &mut exp)?.0),
        Expression::Value(value) => Ok(value.evaluate(&mut exp)?.0),
        Expression::Boolean(condition) => {
            let end_label = ctx.new_label();
            let mut code = condition.evaluate(&mut exp, &end_label, &end_label)?;
            code += Instruction::Label(end_label);
            Ok(code)
        }
    }
}

fn if_else(statement: &IfElseStatement, ctx: &mut LocalContext) -> Result<Code, Error> {
    let label = ctx.new_label();
    let then_label = format!("{label}_then");
    let else_label = format!("{label}_else");
    let end_label = format!("{label}_end");

    let mut code =
        statement
            .condition
            .evaluate(&mut ExpressionContext::new(ctx), &then_label, &else_label)?;
    code += Instruction::Label(then_label);
    code += statement.then_block.compile(ctx)?;
    code += Instruction::Branch(end_label.clone());
    code += Instruction::Label(else_label);
    code += statement.else_block.compile(ctx)?;
    code += Instruction::Label(end_label);

    Ok(code)
}

fn while_loop(statement: &WhileStatement, ctx: &mut LocalContext) -> Result<Code, Error> {
    let label = ctx.new_label();
    let loop_label = format!("{label}_loop");
    let body_label = format!("{label}_body");
    let end_label = format!("{label}_end");

    let mut scope = LocalContext::looping(ctx, end_label.clone(), loop_label.clone());

    let mut code = Code::from(Instruction::Label(loop_label.clone()));
    code += statement
        .condition
        .evaluate(&mut ExpressionContext::new(&scope), &body_label, &end_label)?;
    code += Instruction::Label(body_label);
    code += statement.body.compile(&mut scope)?;
    code += Instruction::Branch(loop_label);
    code += Instruction::Label(end_label);

    Ok(code)
}

fn for_loop(statement: &ForStatement, ctx: &mut LocalContext) -> Result<Code, Error> {
    let label = ctx.new_label();
    let loop_label = format!("{label}_loop");
    let body_label = format!("{label}_body");
    let step_label = format!("{label}_step");
    let end_label = format!("{label}_end");

    // Variables declared by the initializer are visible up to the end of the loop.
    let mut scope = LocalContext::looping(ctx, end_label.clone(), step_label.clone());

    let mut code = statement.initializer.compile(&mut scope)?;
    code += Instruction::Label(loop_label.clone());
    code += statement
        .condition
        .evaluate(&mut ExpressionContext::new(&scope), &body_label, &end_label)?;
    code += Instruction::Label(body_label);
    code += statement.body.compile(&mut scope)?;
    code += Instruction::Label(step_label);
    code += discard(&statement.step, &scope)?;
    code += Instruction::Branch(loop_label);
    code += Instruction::Label(end_label);

    Ok(code)
}

/// Checks that every case label is a distinct constant. Returns the values in
/// case order, with `None` for the default case.
fn case_values(switch: &SwitchStatement) -> Result<Vec<Option<i32>>, Error> {
    let mut seen = HashSet::new();

    switch
        .cases
        .iter()
        .map(|case| match &case.label {
            CaseLabel::Default => Ok(None),
            CaseLabel::Value(value) => {
                let value = value
                    .precomputable()
                    .ok_or(Error::NonConstantCase(case.location))?;
                if !seen.insert(value) {
                    return Err(Error::DuplicateCase(value, case.location));
                }
                Ok(Some(value))
            }
        })
        .collect()
}

fn switch(statement: &SwitchStatement, ctx: &mut LocalContext) -> Result<Code, Error> {
    let values = case_values(statement)?;

    let label = ctx.new_label();
    let end_label = format!("{label}_end");
    let case_labels: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, value)| match value {
            Some(_) => format!("{label}_case{i}"),
            None => format!("{label}_default"),
        })
        .collect();

    let (mut code, subject) = statement.subject.evaluate(&mut ExpressionContext::new(ctx))?;
    code += comment!(ctx.global(), "switch dispatch");
    code += subject.load_value(Register::V0);
    for (value, case_label) in values.iter().zip(&case_labels) {
        if let Some(value) = value {
            code += Instruction::BranchEq(Register::V0, (*value).into(), case_label.clone());
        }
    }
    let fallback = match statement.default_case() {
        Some(index) => case_labels[index].clone(),
        None => end_label.clone(),
    };
    code += Instruction::Branch(fallback);

    // Cases share one scope; control falls from one case into the next.
    let mut scope = LocalContext::breakable(ctx, end_label.clone());
    for (case, case_label) in statement.cases.iter().zip(case_labels) {
        code += Instruction::Label(case_label);
        code += case.body.compile(&mut scope)?;
    }
    code += Instruction::Label(end_label);

    Ok(code)
}

fn return_value(
    value: &Spanned<Option<ValueExpression>>,
    ctx: &LocalContext,
) -> Result<Code, Error> {
    let function = ctx.function();
    let mut code = Code::new();

    if let Some(value) = &value.node {
        match value.precomputable() {
            Some(constant) => code += Instruction::LoadImmediate(Register::V0, constant),
            None => {
                let (value_code, symbol) = value.evaluate(&mut ExpressionContext::new(ctx))?;
                code += value_code;
                code += symbol.load_value(Register::V0);
            }
        }
        code += truncate(function.function.return_type, Register::V0);
    }
    code += Instruction::Branch(function.epilogue.clone());

    Ok(code)
}

impl Compile for Statement {
    fn compile(&self, ctx: &mut LocalContext) -> Result<Code, Error> {
        match self {
            Statement::Declaration(declaration) => {
                let symbol =
                    ctx.declare_variable(&declaration.name, declaration.ty, declaration.location)?;
                Ok(comment!(
                    ctx.global(),
                    "{} : {} at {}",
                    symbol.name,
                    symbol.ty,
                    symbol.storage
                ))
            }
            Statement::Expression(expression) => discard(expression, ctx),
            Statement::Block(block) => block.compile(ctx),
            Statement::IfElse(statement) => if_else(statement, ctx),
            Statement::While(statement) => while_loop(statement, ctx),
            Statement::For(statement) => for_loop(statement, ctx),
            Statement::Switch(statement) => switch(statement, ctx),
            Statement::Break(location) => match ctx.break_label() {
                Some(label) => Ok(Code::from(Instruction::Branch(label.to_string()))),
                None => Err(Error::NoEnclosingBreakTarget(*location)),
            },
            Statement::Continue(location) => match ctx.continue_label() {
                Some(label) => Ok(Code::from(Instruction::Branch(label.to_string()))),
                None => Err(Error::NoEnclosingLoop(*location)),
            },
            Statement::Return(value) => return_value(value, ctx),
        }
    }
}
