#[cfg(test)]
mod test;

/// Emits a `#` comment line when the compiler runs in debug mode.
macro_rules! comment {
    ($ctx: expr, $($arg: tt)*) => {
        if $ctx.debug() {
            $crate::code::Code::from($crate::code::Instruction::Comment(format!($($arg)*)))
        } else {
            $crate::code::Code::new()
        }
    };
}

pub mod code;
pub mod context;
mod definition;
mod expression;
mod statement;
pub mod symbols;

use ast::{Location, Program, SymbolType};
use code::{Code, Instruction, Section};
use context::GlobalContext;
use definition::CompileDefinition;
use quick_error::quick_error;
use tracing::{debug, instrument};

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        UndefinedSymbol(name: String, location: Location) {
            display("undefined symbol \"{name}\"")
        }
        Redeclaration(name: String, location: Location) {
            display("redeclaration of \"{name}\"")
        }
        InvalidType(name: String, ty: SymbolType, location: Location) {
            display("\"{name}\" cannot be declared with type {ty}")
        }
        NotAVariable(name: String, location: Location) {
            display("\"{name}\" is a function, not a variable")
        }
        NotAFunction(name: String, location: Location) {
            display("\"{name}\" is not a function")
        }
        NotAssignable(name: String, location: Location) {
            display("cannot assign to \"{name}\"")
        }
        NotIndexable(name: String, location: Location) {
            display("\"{name}\" is not an array")
        }
        VoidValue(name: String, location: Location) {
            display("\"{name}\" returns void and has no value")
        }
        TooManyArguments(name: String, location: Location) {
            display("more than 4 arguments cannot be passed to \"{name}\"")
        }
        TooManyParameters(name: String, location: Location) {
            display("\"{name}\" cannot take more than 4 parameters")
        }
        ArgumentCount(name: String, expected: usize, found: usize, location: Location) {
            display("\"{name}\" takes {expected} arguments but {found} were given")
        }
        IncompatibleArgument(name: String, expected: SymbolType, found: SymbolType, location: Location) {
            display("argument of type {found} cannot be passed as {expected} to \"{name}\"")
        }
        MainParameters(location: Location) {
            display("\"main\" cannot take parameters")
        }
        NonConstantCase(location: Location) {
            display("case value must be a constant expression")
        }
        DuplicateCase(value: i32, location: Location) {
            display("duplicate case value {value}")
        }
        NoEnclosingLoop(location: Location) {
            display("no outer loop exists")
        }
        NoEnclosingBreakTarget(location: Location) {
            display("no outer loop or switch statement exists")
        }
        NonConstantInitializer(name: String, location: Location) {
            display("value assigned to global variable \"{name}\" must be a constant expression")
        }
        InitializerMismatch(name: String, ty: SymbolType, location: Location) {
            display("initializer does not match type {ty} of \"{name}\"")
        }
        LiteralTooLong(name: String, location: Location) {
            display("string literal does not fit in \"{name}\"")
        }
    }
}

impl Error {
    /// Where in the source the error was detected.
    pub fn location(&self) -> Location {
        match self {
            Error::UndefinedSymbol(_, location)
            | Error::Redeclaration(_, location)
            | Error::InvalidType(_, _, location)
            | Error::NotAVariable(_, location)
            | Error::NotAFunction(_, location)
            | Error::NotAssignable(_, location)
            | Error::NotIndexable(_, location)
            | Error::VoidValue(_, location)
            | Error::TooManyArguments(_, location)
            | Error::TooManyParameters(_, location)
            | Error::ArgumentCount(_, _, _, location)
            | Error::IncompatibleArgument(_, _, _, location)
            | Error::MainParameters(location)
            | Error::NonConstantCase(location)
            | Error::DuplicateCase(_, location)
            | Error::NoEnclosingLoop(location)
            | Error::NoEnclosingBreakTarget(location)
            | Error::NonConstantInitializer(_, location)
            | Error::InitializerMismatch(_, _, location)
            | Error::LiteralTooLong(_, location) => *location,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CompilerConfig {
    /// Annotate the output with `#` comments.
    pub debug: bool,
    /// Assembly appended after the program, typically the runtime routines
    /// the program calls.
    pub runtime_support: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Category {
    Warning,
    Note,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Warning => write!(f, "warning"),
            Category::Note => write!(f, "note"),
        }
    }
}

/// An advisory message that does not stop compilation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Notice {
    pub location: Location,
    pub category: Category,
    pub message: String,
}

type NoticeCallback<'a> = Box<dyn FnMut(&Location, Category, &str) + 'a>;

pub struct Compiler<'a> {
    config: CompilerConfig,
    notices: NoticeCallback<'a>,
}

impl<'a> Compiler<'a> {
    pub fn new(config: Option<CompilerConfig>) -> Self {
        Self {
            config: config.unwrap_or_default(),
            notices: Box::new(|_, _, _| {}),
        }
    }

    /// Sets the callback receiving notices, in the order they were raised.
    pub fn with_notices(mut self, callback: impl FnMut(&Location, Category, &str) + 'a) -> Self {
        self.notices = Box::new(callback);
        self
    }

    fn forward_notices(&mut self, ctx: &GlobalContext) {
        for notice in ctx.take_notices() {
            (self.notices)(&notice.location, notice.category, &notice.message);
        }
    }

    /// Compiles the program, definitions in order. The first error aborts
    /// the compilation.
    #[instrument(skip_all, fields(definitions = program.definitions.len()))]
    pub fn compile(mut self, program: &Program) -> Result<Code, Error> {
        let mut ctx = GlobalContext::new(self.config.debug);

        let mut code: Code = [
            Instruction::Section(Section::Data),
            Instruction::Align(2),
            Instruction::Section(Section::Text),
            Instruction::Jump("main".into()),
        ]
        .into_iter()
        .collect();

        for definition in &program.definitions {
            debug!(name = definition.name(), "compiling definition");
            let result = definition.compile(&mut ctx);
            self.forward_notices(&ctx);
            code += result?;
        }

        if !ctx.has_main() {
            ctx.notice(
                Location::default(),
                Category::Note,
                "program does not define a main function",
            );
            self.forward_notices(&ctx);
        }

        if let Some(runtime) = &self.config.runtime_support {
            code += ctx.switch_to(Section::Text);
            code += Instruction::Verbatim(runtime.clone());
        }

        Ok(code)
    }
}
