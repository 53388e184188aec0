//! Code generation for a small C-like language.
//!
//! A front end builds an [`ast::Program`]; [`compile_to_string`] turns it into
//! MIPS-style assembly text. The assembly expects the runtime routines
//! (`print_int`, `exit`, `$out_of_bounds_error`, ...) to be linked in, either
//! by the assembler or through [`CompilerConfig::runtime_support`].

pub use ast;
pub use compiler;
pub use compiler::{Category, Compiler, CompilerConfig, Error, Notice};

/// Compiles `program` and returns the assembly together with every notice
/// raised on the way.
pub fn compile_to_string(
    program: &ast::Program,
    config: CompilerConfig,
) -> Result<(String, Vec<Notice>), Error> {
    let mut notices = Vec::new();

    let code = Compiler::new(Some(config))
        .with_notices(|location: &ast::Location, category: Category, message: &str| {
            notices.push(Notice {
                location: *location,
                category,
                message: message.to_string(),
            })
        })
        .compile(program)?;

    Ok((code.to_string(), notices))
}
