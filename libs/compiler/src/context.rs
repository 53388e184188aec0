use crate::code::{Code, Instruction, Section};
use crate::symbols::{Binding, FunctionSymbol, Symbol};
use crate::{Category, Error, Notice};
use ast::{Location, SymbolType, ValueType};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Cells in the frame are word aligned.
const STACK_ALIGNMENT: u32 = 4;

/// Routines supplied by the runtime library, visible to every program.
const BUILTINS: &[(&str, SymbolType, &[SymbolType])] = &[
    ("print_string", SymbolType::Void, &[SymbolType::Pointer(ValueType::Char)]),
    ("print_char", SymbolType::Void, &[SymbolType::CHAR]),
    ("print_int", SymbolType::Void, &[SymbolType::INT]),
    (
        "read_string",
        SymbolType::Void,
        &[SymbolType::Pointer(ValueType::Char), SymbolType::INT],
    ),
    ("read_char", SymbolType::CHAR, &[]),
    ("read_int", SymbolType::INT, &[]),
    ("exit", SymbolType::Void, &[]),
    ("exit2", SymbolType::Void, &[SymbolType::INT]),
    ("$out_of_bounds_error", SymbolType::Void, &[SymbolType::INT]),
];

/// Whole-program state of one compilation.
pub struct GlobalContext {
    debug: bool,
    symbols: HashMap<String, Binding>,
    label_counter: Cell<usize>,
    section: Section,
    notices: RefCell<Vec<Notice>>,
    has_main: bool,
}

impl GlobalContext {
    /// A fresh context holding only the runtime routines. The output is
    /// expected to start in the text section.
    pub fn new(debug: bool) -> Self {
        let symbols = BUILTINS
            .iter()
            .map(|(name, return_type, parameters)| {
                let function = FunctionSymbol {
                    name: name.to_string(),
                    return_type: *return_type,
                    parameters: parameters.to_vec(),
                    location: Location::default(),
                };
                (name.to_string(), Binding::Function(Rc::new(function)))
            })
            .collect();

        Self {
            debug,
            symbols,
            label_counter: Cell::new(0),
            section: Section::Text,
            notices: RefCell::new(Vec::new()),
            has_main: false,
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Returns a label never returned before in this compilation.
    pub fn new_label(&self) -> String {
        let n = self.label_counter.get() + 1;
        self.label_counter.set(n);
        trace!(label = n, "allocated label");
        format!("$L{n}")
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.symbols.get(name).cloned()
    }

    fn declare(&mut self, name: &str, binding: Binding, location: Location) -> Result<(), Error> {
        if self.symbols.contains_key(name) {
            return Err(Error::Redeclaration(name.to_string(), location));
        }
        self.symbols.insert(name.to_string(), binding);
        Ok(())
    }

    pub fn declare_field(
        &mut self,
        name: &str,
        ty: SymbolType,
        location: Location,
    ) -> Result<Rc<Symbol>, Error> {
        let declarable = matches!(ty, SymbolType::Value(_) | SymbolType::Array(..));
        if !declarable || ty.checked_width().is_none() {
            return Err(Error::InvalidType(name.to_string(), ty, location));
        }

        let symbol = Rc::new(Symbol::global(name, ty, location));
        self.declare(name, Binding::Variable(symbol.clone()), location)?;
        Ok(symbol)
    }

    pub fn declare_function(
        &mut self,
        name: &str,
        return_type: SymbolType,
        parameters: Vec<SymbolType>,
        location: Location,
    ) -> Result<Rc<FunctionSymbol>, Error> {
        let function = Rc::new(FunctionSymbol {
            name: name.to_string(),
            return_type,
            parameters,
            location,
        });
        self.declare(name, Binding::Function(function.clone()), location)?;
        Ok(function)
    }

    pub fn declare_main(
        &mut self,
        return_type: SymbolType,
        location: Location,
    ) -> Result<Rc<FunctionSymbol>, Error> {
        let main = self.declare_function("main", return_type, Vec::new(), location)?;
        self.has_main = true;
        Ok(main)
    }

    pub fn has_main(&self) -> bool {
        self.has_main
    }

    /// Emits a section directive unless the output is already in `section`.
    pub fn switch_to(&mut self, section: Section) -> Code {
        if self.section == section {
            return Code::new();
        }
        self.section = section;
        Code::from(Instruction::Section(section))
    }

    /// Records an advisory message; compilation goes on.
    pub fn notice(&self, location: Location, category: Category, message: impl Into<String>) {
        let message = message.into();
        debug!(%location, %category, "{message}");
        self.notices.borrow_mut().push(Notice {
            location,
            category,
            message,
        });
    }

    /// Removes and returns the notices recorded so far, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices.take()
    }
}

/// Frame layout of the function being compiled.
///
/// `$fp` points at the saved `$fp`/`$ra` pair; parameters, locals and
/// temporaries sit below it at negative offsets, in that order. Scopes that
/// have ended give their space back, so the frame is as deep as the deepest
/// point reached while compiling the body.
pub struct FunctionContext<'a> {
    pub global: &'a GlobalContext,
    pub function: Rc<FunctionSymbol>,
    pub epilogue: String,
    parameters: Vec<Rc<Symbol>>,
    depth: u32,
    frame_size: Cell<u32>,
}

impl<'a> FunctionContext<'a> {
    pub fn new(global: &'a GlobalContext, function: Rc<FunctionSymbol>) -> Self {
        Self {
            global,
            epilogue: format!("${}_epilogue", function.name),
            function,
            parameters: Vec::new(),
            depth: 0,
            frame_size: Cell::new(0),
        }
    }

    pub fn declare_parameter(
        &mut self,
        name: &str,
        ty: SymbolType,
        location: Location,
    ) -> Result<Rc<Symbol>, Error> {
        if !matches!(ty, SymbolType::Value(_) | SymbolType::Pointer(_)) {
            return Err(Error::InvalidType(name.to_string(), ty, location));
        }
        if self.parameters.iter().any(|p| p.name == name) {
            return Err(Error::Redeclaration(name.to_string(), location));
        }

        self.depth += ty.aligned_width();
        let symbol = Rc::new(Symbol::frame(name, ty, -(self.depth as i32), location));
        self.parameters.push(symbol.clone());
        self.reserve(self.depth);

        Ok(symbol)
    }

    pub fn parameters(&self) -> &[Rc<Symbol>] {
        &self.parameters
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> {
        match self.parameters.iter().find(|p| p.name == name) {
            Some(parameter) => Some(Binding::Variable(parameter.clone())),
            None => self.global.lookup(name),
        }
    }

    /// Grows the frame to at least `depth` bytes.
    fn reserve(&self, depth: u32) {
        if depth > self.frame_size.get() {
            self.frame_size.set(depth);
        }
    }

    /// Bytes below `$fp` the body needs.
    pub fn frame_size(&self) -> u32 {
        self.frame_size.get()
    }
}

/// One block scope.
pub struct LocalContext<'a> {
    function: &'a FunctionContext<'a>,
    parent: Option<&'a LocalContext<'a>>,
    symbols: HashMap<String, Rc<Symbol>>,
    base: u32,
    depth: u32,
    break_label: Option<String>,
    continue_label: Option<String>,
}

impl<'a> LocalContext<'a> {
    /// The outermost scope of a function body.
    pub fn new(function: &'a FunctionContext<'a>) -> Self {
        Self {
            function,
            parent: None,
            symbols: HashMap::new(),
            base: function.depth,
            depth: 0,
            break_label: None,
            continue_label: None,
        }
    }

    pub fn scoped(parent: &'a LocalContext<'a>) -> Self {
        Self {
            function: parent.function,
            parent: Some(parent),
            symbols: HashMap::new(),
            base: parent.cumulative_depth(),
            depth: 0,
            break_label: None,
            continue_label: None,
        }
    }

    /// A scope `break` can leave, such as a switch body.
    pub fn breakable(parent: &'a LocalContext<'a>, break_label: String) -> Self {
        Self {
            break_label: Some(break_label),
            ..Self::scoped(parent)
        }
    }

    /// A loop scope: `break` leaves it and `continue` starts the next iteration.
    pub fn looping(
        parent: &'a LocalContext<'a>,
        break_label: String,
        continue_label: String,
    ) -> Self {
        Self {
            break_label: Some(break_label),
            continue_label: Some(continue_label),
            ..Self::scoped(parent)
        }
    }

    pub fn function(&self) -> &'a FunctionContext<'a> {
        self.function
    }

    pub fn global(&self) -> &'a GlobalContext {
        self.function.global
    }

    pub fn new_label(&self) -> String {
        self.global().new_label()
    }

    /// Bytes of the frame in use by this scope and the ones enclosing it.
    pub fn cumulative_depth(&self) -> u32 {
        self.base + self.depth
    }

    pub fn declare_variable(
        &mut self,
        name: &str,
        ty: SymbolType,
        location: Location,
    ) -> Result<Rc<Symbol>, Error> {
        if !matches!(ty, SymbolType::Value(_) | SymbolType::Array(..)) {
            return Err(Error::InvalidType(name.to_string(), ty, location));
        }
        if self.symbols.contains_key(name) {
            return Err(Error::Redeclaration(name.to_string(), location));
        }

        // The whole frame must stay addressable from `$fp`.
        let depth = ty
            .checked_width()
            .and_then(|_| self.cumulative_depth().checked_add(ty.aligned_width()))
            .filter(|depth| *depth <= i32::MAX as u32)
            .ok_or_else(|| Error::InvalidType(name.to_string(), ty, location))?;
        self.depth = depth - self.base;
        let symbol = Rc::new(Symbol::frame(name, ty, -(depth as i32), location));
        self.symbols.insert(name.to_string(), symbol.clone());
        self.function.reserve(depth);

        Ok(symbol)
    }

    /// Resolves `name` from the innermost scope outwards, then parameters,
    /// then globals.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        if let Some(symbol) = self.symbols.get(name) {
            return Some(Binding::Variable(symbol.clone()));
        }
        match self.parent {
            Some(parent) => parent.lookup(name),
            None => self.function.lookup(name),
        }
    }

    pub fn break_label(&self) -> Option<&str> {
        match &self.break_label {
            Some(label) => Some(label),
            None => self.parent.and_then(|parent| parent.break_label()),
        }
    }

    pub fn continue_label(&self) -> Option<&str> {
        match &self.continue_label {
            Some(label) => Some(label),
            None => self.parent.and_then(|parent| parent.continue_label()),
        }
    }
}

/// Temporary storage for evaluating one expression.
///
/// Temporaries are allocated above everything the scope declared. Cloning
/// the context gives operands their own area: a node evaluates its operands
/// in a clone and then allocates its result in the original, reusing the
/// operand cells once their values have been loaded.
#[derive(Clone)]
pub struct ExpressionContext<'a> {
    local: &'a LocalContext<'a>,
    depth: u32,
}

impl<'a> ExpressionContext<'a> {
    pub fn new(local: &'a LocalContext<'a>) -> Self {
        Self { local, depth: 0 }
    }

    pub fn local(&self) -> &'a LocalContext<'a> {
        self.local
    }

    pub fn global(&self) -> &'a GlobalContext {
        self.local.global()
    }

    pub fn new_label(&self) -> String {
        self.local.new_label()
    }

    pub fn new_temp(&mut self, location: Location) -> Rc<Symbol> {
        self.depth += STACK_ALIGNMENT;
        let depth = self.local.cumulative_depth() + self.depth;
        self.local.function().reserve(depth);

        Rc::new(Symbol::temporary(SymbolType::INT, -(depth as i32), location))
    }

    /// Resolves a name used as a variable.
    pub fn variable(&self, name: &str, location: Location) -> Result<Rc<Symbol>, Error> {
        match self.local.lookup(name) {
            Some(Binding::Variable(symbol)) => Ok(symbol),
            Some(Binding::Function(_)) => Err(Error::NotAVariable(name.to_string(), location)),
            None => Err(Error::UndefinedSymbol(name.to_string(), location)),
        }
    }

    /// Resolves a name used as a callee.
    pub fn function(&self, name: &str, location: Location) -> Result<Rc<FunctionSymbol>, Error> {
        match self.local.lookup(name) {
            Some(Binding::Function(function)) => Ok(function),
            Some(Binding::Variable(_)) => Err(Error::NotAFunction(name.to_string(), location)),
            None => Err(Error::UndefinedSymbol(name.to_string(), location)),
        }
    }
}
