use crate::code::{Address, Code, Instruction, Register};
use ast::{Location, SymbolType, ValueType};
use std::rc::Rc;

/// Where a symbol's value lives at run time.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Storage {
    /// A labelled cell in the data section.
    Global(String),
    /// A word-aligned cell at a fixed offset from `$fp`: parameters, locals
    /// and expression temporaries.
    Frame(i32),
}

impl std::fmt::Display for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Storage::Global(label) => write!(f, "{label}"),
            Storage::Frame(offset) => write!(f, "{offset}($fp)"),
        }
    }
}

const TEMPORARY: &str = "$tmp";

/// One storage location and the type of what it holds.
#[derive(Debug, PartialEq, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: SymbolType,
    pub storage: Storage,
    pub location: Location,
}

impl Symbol {
    pub fn global(name: impl Into<String>, ty: SymbolType, location: Location) -> Self {
        let name = name.into();
        Self {
            storage: Storage::Global(name.clone()),
            name,
            ty,
            location,
        }
    }

    pub fn frame(name: impl Into<String>, ty: SymbolType, offset: i32, location: Location) -> Self {
        Self {
            name: name.into(),
            ty,
            storage: Storage::Frame(offset),
            location,
        }
    }

    /// An unnamed expression cell.
    pub fn temporary(ty: SymbolType, offset: i32, location: Location) -> Self {
        Self::frame(TEMPORARY, ty, offset, location)
    }

    pub fn is_temporary(&self) -> bool {
        self.name == TEMPORARY
    }

    fn address(&self) -> Address {
        match &self.storage {
            Storage::Global(label) => Address::Label(label.clone()),
            Storage::Frame(offset) => Address::Offset(*offset, Register::Fp),
        }
    }

    /// Globals of type `char` occupy a single byte; every other cell is a word.
    fn is_byte(&self) -> bool {
        matches!(self.storage, Storage::Global(_)) && self.ty == SymbolType::CHAR
    }

    /// Loads the symbol's value into `register`. The value of an array is
    /// its address.
    pub fn load_value(&self, register: Register) -> Code {
        let instruction = match (&self.storage, self.ty) {
            (Storage::Global(label), SymbolType::Array(..)) => {
                Instruction::LoadAddress(register, Address::Label(label.clone()))
            }
            (Storage::Frame(offset), SymbolType::Array(..)) => {
                Instruction::Add(register, Register::Fp, (*offset).into())
            }
            _ if self.is_byte() => Instruction::LoadByteUnsigned(register, self.address()),
            _ => Instruction::LoadWord(register, self.address()),
        };

        Code::from(instruction)
    }

    /// Stores `register` into the symbol's cell.
    pub fn save_value(&self, register: Register) -> Code {
        if self.is_byte() {
            Code::from(Instruction::StoreByte(register, self.address()))
        } else {
            Code::from(Instruction::StoreWord(register, self.address()))
        }
    }

    /// Leaves the address of element `index` in `$t0`. Arrays are addressed
    /// in place; any other symbol holds the address of its first element.
    /// Clobbers `index`.
    fn element_address(&self, element: ValueType, index: Register) -> Code {
        let mut code = match self.ty {
            SymbolType::Array(..) => self.load_value(Register::T0),
            _ => Code::from(Instruction::LoadWord(Register::T0, self.address())),
        };

        if element.width() != 1 {
            code += Instruction::Mul(index, index, (element.width() as i32).into());
        }
        code += Instruction::Add(Register::T0, Register::T0, index.into());

        code
    }

    /// Loads element `index` into `register`.
    pub fn load_element(&self, element: ValueType, index: Register, register: Register) -> Code {
        let mut code = self.element_address(element, index);
        code += match element {
            ValueType::Char => {
                Instruction::LoadByteUnsigned(register, Address::Offset(0, Register::T0))
            }
            ValueType::Int => Instruction::LoadWord(register, Address::Offset(0, Register::T0)),
        };
        code
    }

    /// Stores `register` into element `index`.
    pub fn save_element(&self, element: ValueType, index: Register, register: Register) -> Code {
        let mut code = self.element_address(element, index);
        code += match element {
            ValueType::Char => Instruction::StoreByte(register, Address::Offset(0, Register::T0)),
            ValueType::Int => Instruction::StoreWord(register, Address::Offset(0, Register::T0)),
        };
        code
    }
}

/// A callable routine, either defined in the program or supplied by the runtime.
#[derive(Debug, PartialEq, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub return_type: SymbolType,
    pub parameters: Vec<SymbolType>,
    pub location: Location,
}

impl FunctionSymbol {
    pub fn label(&self) -> &str {
        &self.name
    }
}

/// What a name resolves to.
#[derive(Debug, Clone)]
pub enum Binding {
    Variable(Rc<Symbol>),
    Function(Rc<FunctionSymbol>),
}
