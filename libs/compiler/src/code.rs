use std::fmt;
use std::ops::{AddAssign, Deref};

/// Machine registers the generated code touches.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Register {
    Zero,
    /// First scratch register; also carries return values.
    V0,
    /// Second scratch register.
    V1,
    A0,
    A1,
    A2,
    A3,
    /// Address and bounds-check scratch register.
    T0,
    Sp,
    Fp,
    Ra,
}

impl Register {
    /// Argument-passing registers, in parameter order.
    pub const ARGUMENTS: [Register; 4] = [Register::A0, Register::A1, Register::A2, Register::A3];
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::Zero => "$zero",
            Register::V0 => "$v0",
            Register::V1 => "$v1",
            Register::A0 => "$a0",
            Register::A1 => "$a1",
            Register::A2 => "$a2",
            Register::A3 => "$a3",
            Register::T0 => "$t0",
            Register::Sp => "$sp",
            Register::Fp => "$fp",
            Register::Ra => "$ra",
        };
        write!(f, "{name}")
    }
}

/// The last source operand of arithmetic and branch instructions.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operand {
    Register(Register),
    Immediate(i32),
}

impl From<Register> for Operand {
    fn from(register: Register) -> Self {
        Operand::Register(register)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Immediate(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{r}"),
            Operand::Immediate(n) => write!(f, "{n}"),
        }
    }
}

/// Memory operand of loads and stores.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Address {
    /// `offset(base)`
    Offset(i32, Register),
    /// `label`
    Label(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Offset(offset, base) => write!(f, "{offset}({base})"),
            Address::Label(label) => write!(f, "{label}"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Section {
    Data,
    Text,
}

/// A single line of output: an instruction, a label, or an assembler directive.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instruction {
    /// `name:`
    Label(String),
    /// `# text`
    Comment(String),
    /// `.data` or `.text`
    Section(Section),
    /// `.globl name`
    Globl(String),
    /// `.align n`
    Align(u32),
    /// `.word value`
    Word(i32),
    /// `.byte value`
    Byte(i32),
    /// `.space bytes`
    Space(u32),
    /// `.asciiz "text"`
    Asciiz(String),
    /// Assembly text copied to the output unchanged.
    Verbatim(String),

    /// `li dst value` - Load Immediate
    LoadImmediate(Register, i32),
    /// `la dst address` - Load Address
    LoadAddress(Register, Address),
    /// `lw dst address` - Load Word
    LoadWord(Register, Address),
    /// `lbu dst address` - Load Byte Unsigned
    LoadByteUnsigned(Register, Address),
    /// `sw src address` - Store Word
    StoreWord(Register, Address),
    /// `sb src address` - Store Byte
    StoreByte(Register, Address),
    /// `move dst src`
    Move(Register, Register),

    /// `negu dst a` - Negate
    Negate(Register, Register),
    /// `not dst a` - Bitwise NOT
    Not(Register, Register),
    /// `addu dst a b` - Addition
    Add(Register, Register, Operand),
    /// `subu dst a b` - Subtraction
    Sub(Register, Register, Operand),
    /// `mul dst a b` - Multiplication
    Mul(Register, Register, Operand),
    /// `divu dst a b` - Unsigned Division
    Div(Register, Register, Operand),
    /// `and dst a b` - Bitwise AND
    And(Register, Register, Operand),
    /// `or dst a b` - Bitwise OR
    Or(Register, Register, Operand),
    /// `xor dst a b` - Bitwise XOR
    Xor(Register, Register, Operand),

    /// `b label` - Unconditional Branch
    Branch(String),
    /// `beq a b label` - Branch if Equal
    BranchEq(Register, Operand, String),
    /// `bne a b label` - Branch if Not Equal
    BranchNe(Register, Operand, String),
    /// `bgt a b label` - Branch if Greater Than
    BranchGt(Register, Operand, String),
    /// `bge a b label` - Branch if Greater or Equal
    BranchGe(Register, Operand, String),
    /// `blt a b label` - Branch if Less Than
    BranchLt(Register, Operand, String),
    /// `ble a b label` - Branch if Less or Equal
    BranchLe(Register, Operand, String),
    /// `bltz a label` - Branch if Less Than Zero
    BranchLtZero(Register, String),

    /// `j label` - Jump
    Jump(String),
    /// `jal label` - Jump and Link (Function Call)
    JumpAndLink(String),
    /// `jr register` - Jump Register
    JumpRegister(Register),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const TAB: &str = "    ";

        match self {
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Comment(text) => write!(f, "{TAB}# {text}"),
            Instruction::Section(Section::Data) => write!(f, ".data"),
            Instruction::Section(Section::Text) => write!(f, ".text"),
            Instruction::Globl(name) => write!(f, ".globl {name}"),
            Instruction::Align(n) => write!(f, ".align {n}"),
            Instruction::Word(value) => write!(f, "{TAB}.word {value}"),
            Instruction::Byte(value) => write!(f, "{TAB}.byte {value}"),
            Instruction::Space(bytes) => write!(f, "{TAB}.space {bytes}"),
            Instruction::Asciiz(text) => write!(f, "{TAB}.asciiz \"{}\"", text.escape_default()),
            Instruction::Verbatim(text) => write!(f, "{}", text.trim_end()),

            Instruction::LoadImmediate(dst, value) => write!(f, "{TAB}li {dst}, {value}"),
            Instruction::LoadAddress(dst, address) => write!(f, "{TAB}la {dst}, {address}"),
            Instruction::LoadWord(dst, address) => write!(f, "{TAB}lw {dst}, {address}"),
            Instruction::LoadByteUnsigned(dst, address) => write!(f, "{TAB}lbu {dst}, {address}"),
            Instruction::StoreWord(src, address) => write!(f, "{TAB}sw {src}, {address}"),
            Instruction::StoreByte(src, address) => write!(f, "{TAB}sb {src}, {address}"),
            Instruction::Move(dst, src) => write!(f, "{TAB}move {dst}, {src}"),

            Instruction::Negate(dst, a) => write!(f, "{TAB}negu {dst}, {a}"),
            Instruction::Not(dst, a) => write!(f, "{TAB}not {dst}, {a}"),
            Instruction::Add(dst, a, b) => write!(f, "{TAB}addu {dst}, {a}, {b}"),
            Instruction::Sub(dst, a, b) => write!(f, "{TAB}subu {dst}, {a}, {b}"),
            Instruction::Mul(dst, a, b) => write!(f, "{TAB}mul {dst}, {a}, {b}"),
            Instruction::Div(dst, a, b) => write!(f, "{TAB}divu {dst}, {a}, {b}"),
            Instruction::And(dst, a, b) => write!(f, "{TAB}and {dst}, {a}, {b}"),
            Instruction::Or(dst, a, b) => write!(f, "{TAB}or {dst}, {a}, {b}"),
            Instruction::Xor(dst, a, b) => write!(f, "{TAB}xor {dst}, {a}, {b}"),

            Instruction::Branch(label) => write!(f, "{TAB}b {label}"),
            Instruction::BranchEq(a, b, label) => write!(f, "{TAB}beq {a}, {b}, {label}"),
            Instruction::BranchNe(a, b, label) => write!(f, "{TAB}bne {a}, {b}, {label}"),
            Instruction::BranchGt(a, b, label) => write!(f, "{TAB}bgt {a}, {b}, {label}"),
            Instruction::BranchGe(a, b, label) => write!(f, "{TAB}bge {a}, {b}, {label}"),
            Instruction::BranchLt(a, b, label) => write!(f, "{TAB}blt {a}, {b}, {label}"),
            Instruction::BranchLe(a, b, label) => write!(f, "{TAB}ble {a}, {b}, {label}"),
            Instruction::BranchLtZero(a, label) => write!(f, "{TAB}bltz {a}, {label}"),

            Instruction::Jump(label) => write!(f, "{TAB}j {label}"),
            Instruction::JumpAndLink(label) => write!(f, "{TAB}jal {label}"),
            Instruction::JumpRegister(register) => write!(f, "{TAB}jr {register}"),
        }
    }
}

/// Emitted lines in output order. Code only grows: by appending lines or by
/// appending another `Code`.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Code(Vec<Instruction>);

impl Code {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_inner(self) -> Vec<Instruction> {
        self.0
    }
}

impl Deref for Code {
    type Target = [Instruction];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Instruction> for Code {
    fn from(instruction: Instruction) -> Self {
        Self(vec![instruction])
    }
}

impl FromIterator<Instruction> for Code {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Instruction> for Code {
    fn extend<I: IntoIterator<Item = Instruction>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl AddAssign for Code {
    fn add_assign(&mut self, other: Code) {
        self.0.extend(other.0);
    }
}

impl AddAssign<Instruction> for Code {
    fn add_assign(&mut self, instruction: Instruction) {
        self.0.push(instruction);
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.0 {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}
