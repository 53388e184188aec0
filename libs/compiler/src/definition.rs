use crate::Error;
use crate::code::{Address, Code, Instruction, Register, Section};
use crate::context::{FunctionContext, GlobalContext, LocalContext};
use crate::statement::Compile;
use ast::{
    Definition, FieldDefinition, FunctionDefinition, Initializer, Location, Spanned, SymbolType,
    ValueType,
};
use tracing::{instrument, trace};

/// Bytes pushed on entry for the saved `$ra` and `$fp`.
const SAVED_REGISTERS: i32 = 8;

pub(crate) trait CompileDefinition {
    fn compile(&self, ctx: &mut GlobalContext) -> Result<Code, Error>;
}

impl CompileDefinition for Definition {
    fn compile(&self, ctx: &mut GlobalContext) -> Result<Code, Error> {
        match self {
            Definition::Field(field) => compile_field(field, ctx),
            // Program entry, however it was built.
            Definition::Function(function) if function.name == "main" => {
                compile_main(function, ctx)
            }
            Definition::Function(function) => compile_function(function, ctx),
            Definition::Main(main) => compile_main(main, ctx),
        }
    }
}

fn initial_value(
    field: &Spanned<FieldDefinition>,
    initializer: Option<&Initializer>,
) -> Result<Code, Error> {
    let name = &field.name;

    let mismatch = |location: Location| Error::InitializerMismatch(name.clone(), field.ty, location);

    match (field.ty, initializer) {
        (SymbolType::Value(ty), None) => Ok(Code::from(directive(ty, 0))),
        (SymbolType::Value(ty), Some(Initializer::Value(value))) => {
            let value = value
                .precomputable()
                .ok_or_else(|| Error::NonConstantInitializer(name.clone(), value.location()))?;
            Ok(Code::from(directive(ty, value)))
        }
        (SymbolType::Array(..), None) => Ok(Code::from(Instruction::Space(field.ty.width()))),
        (SymbolType::Array(ValueType::Char, size), Some(Initializer::Text(text))) => {
            // The terminating NUL is part of the literal.
            let length = text.len() as u32 + 1;
            if length > size {
                return Err(Error::LiteralTooLong(name.clone(), text.location));
            }

            let mut code = Code::from(Instruction::Asciiz(text.node.clone()));
            if size > length {
                code += Instruction::Space(size - length);
            }
            Ok(code)
        }
        (_, Some(initializer)) => Err(mismatch(initializer.location())),
        (_, None) => Err(Error::InvalidType(name.clone(), field.ty, field.location)),
    }
}

fn directive(ty: ValueType, value: i32) -> Instruction {
    match ty {
        ValueType::Int => Instruction::Word(value),
        ValueType::Char => Instruction::Byte(value & 0xff),
    }
}

fn compile_field(field: &Spanned<FieldDefinition>, ctx: &mut GlobalContext) -> Result<Code, Error> {
    let symbol = ctx.declare_field(&field.name, field.ty, field.location)?;

    let mut code = ctx.switch_to(Section::Data);
    code += Instruction::Align(2);
    code += Instruction::Label(symbol.name.clone());
    code += initial_value(field, field.initializer.as_ref())?;

    Ok(code)
}

/// Compiles the body in a fresh scope and returns it with the frame size it
/// needs.
fn compile_body(function: &FunctionContext, body: &ast::StatementBlock) -> Result<(Code, u32), Error> {
    let mut local = LocalContext::new(function);
    let code = body.compile(&mut local)?;

    let frame_size = function.frame_size();
    trace!(function = %function.function.name, frame_size, "frame laid out");

    Ok((code, frame_size))
}

fn reserve_frame(frame_size: u32) -> Code {
    if frame_size == 0 {
        return Code::new();
    }
    Code::from(Instruction::Sub(
        Register::Sp,
        Register::Sp,
        (frame_size as i32).into(),
    ))
}

#[instrument(skip_all, fields(name = %definition.name))]
fn compile_function(
    definition: &Spanned<FunctionDefinition>,
    ctx: &mut GlobalContext,
) -> Result<Code, Error> {
    if definition.parameters.len() > Register::ARGUMENTS.len() {
        return Err(Error::TooManyParameters(
            definition.name.clone(),
            definition.location,
        ));
    }

    let parameter_types = definition.parameters.iter().map(|p| p.ty).collect();
    let symbol = ctx.declare_function(
        &definition.name,
        definition.return_type,
        parameter_types,
        definition.location,
    )?;
    let mut code = ctx.switch_to(Section::Text);

    let mut function = FunctionContext::new(ctx, symbol);
    for parameter in &definition.parameters {
        function.declare_parameter(&parameter.name, parameter.ty, parameter.location)?;
    }
    let (body, frame_size) = compile_body(&function, &definition.body)?;

    code.extend([
        Instruction::Label(function.function.label().to_string()),
        Instruction::Sub(Register::Sp, Register::Sp, SAVED_REGISTERS.into()),
        Instruction::StoreWord(Register::Ra, Address::Offset(4, Register::Sp)),
        Instruction::StoreWord(Register::Fp, Address::Offset(0, Register::Sp)),
        Instruction::Move(Register::Fp, Register::Sp),
    ]);
    code += reserve_frame(frame_size);
    for (parameter, register) in function.parameters().iter().zip(Register::ARGUMENTS) {
        code += parameter.save_value(register);
    }

    code += body;

    code.extend([
        Instruction::Label(function.epilogue.clone()),
        Instruction::Move(Register::Sp, Register::Fp),
        Instruction::LoadWord(Register::Ra, Address::Offset(4, Register::Sp)),
        Instruction::LoadWord(Register::Fp, Address::Offset(0, Register::Sp)),
        Instruction::Add(Register::Sp, Register::Sp, SAVED_REGISTERS.into()),
        Instruction::JumpRegister(Register::Ra),
    ]);

    Ok(code)
}

#[instrument(skip_all)]
fn compile_main(
    definition: &Spanned<FunctionDefinition>,
    ctx: &mut GlobalContext,
) -> Result<Code, Error> {
    if let Some(parameter) = definition.parameters.first() {
        return Err(Error::MainParameters(parameter.location));
    }

    let symbol = ctx.declare_main(definition.return_type, definition.location)?;
    let mut code = ctx.switch_to(Section::Text);

    let function = FunctionContext::new(ctx, symbol);
    let (body, frame_size) = compile_body(&function, &definition.body)?;

    code.extend([
        Instruction::Globl(function.function.label().to_string()),
        Instruction::Label(function.function.label().to_string()),
        Instruction::Move(Register::Fp, Register::Sp),
    ]);
    code += reserve_frame(frame_size);

    code += body;

    // Control never comes back: the runtime terminates the process.
    code += Instruction::Label(function.epilogue.clone());
    code += Instruction::Move(Register::Sp, Register::Fp);
    if function.function.return_type == SymbolType::Void {
        code += Instruction::Jump("exit".into());
    } else {
        code += Instruction::Move(Register::A0, Register::V0);
        code += Instruction::Jump("exit2".into());
    }

    Ok(code)
}
