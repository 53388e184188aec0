use anyhow::{anyhow, bail};
use ast::*;
use compiler::Compiler;
use compiler::code::{Address, Code, Instruction, Operand, Register, Section};
use std::collections::{HashMap, VecDeque};

const MEMORY_SIZE: usize = 0x10000;
const DATA_BASE: usize = 0x1000;
const STEP_LIMIT: usize = 1_000_000;

/// How a simulated program stopped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Exit {
    /// `exit`, reached from a `void main`.
    Normal,
    /// `exit2`, with the value returned by an `int main`.
    Status(i32),
    /// The bounds-check trap fired for this index.
    OutOfBounds(i32),
}

#[derive(Debug)]
pub struct Run {
    pub exit: Exit,
    pub output: String,
}

/// Compile the program and run it to completion.
pub fn run(program: &Program) -> anyhow::Result<Run> {
    run_with_input(program, &[])
}

/// Compile the program and run it, serving `read_int`/`read_char` from `input`.
pub fn run_with_input(program: &Program, input: &[i32]) -> anyhow::Result<Run> {
    let code = Compiler::new(None).compile(program)?;

    let mut machine = Machine::load(code);
    machine.input.extend(input);
    let exit = machine.execute()?;

    Ok(Run {
        exit,
        output: machine.output,
    })
}

/// Executes the instruction stream directly. Text labels resolve to
/// instruction indices, data labels to byte addresses; the runtime routines
/// are handled natively.
struct Machine {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    data: HashMap<String, usize>,
    memory: Vec<u8>,
    registers: HashMap<Register, u32>,
    input: VecDeque<i32>,
    output: String,
}

impl Machine {
    fn load(code: Code) -> Self {
        let instructions = code.into_inner();
        let mut labels = HashMap::new();
        let mut data = HashMap::new();
        let mut memory = vec![0; MEMORY_SIZE];
        let mut section = Section::Text;
        let mut cursor = DATA_BASE;

        for (index, instruction) in instructions.iter().enumerate() {
            match (section, instruction) {
                (_, Instruction::Section(next)) => section = *next,
                (Section::Text, Instruction::Label(label)) => {
                    labels.insert(label.clone(), index);
                }
                (Section::Data, Instruction::Label(label)) => {
                    data.insert(label.clone(), cursor);
                }
                (Section::Data, Instruction::Align(n)) => {
                    let alignment = 1usize << n;
                    cursor = cursor.div_ceil(alignment) * alignment;
                }
                (Section::Data, Instruction::Word(value)) => {
                    memory[cursor..cursor + 4].copy_from_slice(&value.to_le_bytes());
                    cursor += 4;
                }
                (Section::Data, Instruction::Byte(value)) => {
                    memory[cursor] = *value as u8;
                    cursor += 1;
                }
                (Section::Data, Instruction::Space(bytes)) => cursor += *bytes as usize,
                (Section::Data, Instruction::Asciiz(text)) => {
                    let bytes = text.as_bytes();
                    memory[cursor..cursor + bytes.len()].copy_from_slice(bytes);
                    cursor += bytes.len() + 1;
                }
                _ => {}
            }
        }

        let registers = HashMap::from([(Register::Sp, MEMORY_SIZE as u32)]);

        Self {
            instructions,
            labels,
            data,
            memory,
            registers,
            input: VecDeque::new(),
            output: String::new(),
        }
    }

    fn get(&self, register: Register) -> u32 {
        match register {
            Register::Zero => 0,
            _ => self.registers.get(&register).copied().unwrap_or(0),
        }
    }

    fn set(&mut self, register: Register, value: u32) {
        if register != Register::Zero {
            self.registers.insert(register, value);
        }
    }

    fn operand(&self, operand: Operand) -> u32 {
        match operand {
            Operand::Register(register) => self.get(register),
            Operand::Immediate(value) => value as u32,
        }
    }

    fn address(&self, address: &Address) -> anyhow::Result<usize> {
        let address = match address {
            Address::Offset(offset, base) => {
                self.get(*base).wrapping_add(*offset as u32) as usize
            }
            Address::Label(label) => *self
                .data
                .get(label)
                .ok_or_else(|| anyhow!("unknown data label {label}"))?,
        };

        if address + 4 > MEMORY_SIZE {
            bail!("address {address:#x} is outside memory");
        }
        Ok(address)
    }

    fn label(&self, label: &str) -> anyhow::Result<usize> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("unknown label {label}"))
    }

    fn load_word(&self, address: usize) -> u32 {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&self.memory[address..address + 4]);
        u32::from_le_bytes(bytes)
    }

    fn arithmetic(
        &mut self,
        dst: Register,
        a: Register,
        b: Operand,
        op: impl Fn(u32, u32) -> u32,
    ) {
        let value = op(self.get(a), self.operand(b));
        self.set(dst, value);
    }

    /// The branch target if the signed comparison holds.
    fn branch(
        &self,
        a: Register,
        b: Operand,
        label: &str,
        holds: impl Fn(i32, i32) -> bool,
    ) -> anyhow::Result<Option<usize>> {
        if holds(self.get(a) as i32, self.operand(b) as i32) {
            Ok(Some(self.label(label)?))
        } else {
            Ok(None)
        }
    }

    /// Runs a runtime routine. Returns how the program ended if the routine
    /// does not return.
    fn runtime(&mut self, routine: &str) -> anyhow::Result<Option<Exit>> {
        let argument = self.get(Register::A0);

        match routine {
            "print_int" => self.output += &(argument as i32).to_string(),
            "print_char" => self.output.push(char::from(argument as u8)),
            "print_string" => {
                let mut address = argument as usize;
                while address < MEMORY_SIZE && self.memory[address] != 0 {
                    self.output.push(char::from(self.memory[address]));
                    address += 1;
                }
            }
            "read_int" | "read_char" => {
                let value = self
                    .input
                    .pop_front()
                    .ok_or_else(|| anyhow!("{routine} called with no input left"))?;
                let value = if routine == "read_char" {
                    value & 0xff
                } else {
                    value
                };
                self.set(Register::V0, value as u32);
            }
            "exit" => return Ok(Some(Exit::Normal)),
            "exit2" => return Ok(Some(Exit::Status(argument as i32))),
            "$out_of_bounds_error" => return Ok(Some(Exit::OutOfBounds(argument as i32))),
            _ => bail!("jump to undefined routine {routine}"),
        }

        Ok(None)
    }

    fn execute(&mut self) -> anyhow::Result<Exit> {
        let mut pc = 0;

        for _ in 0..STEP_LIMIT {
            let Some(instruction) = self.instructions.get(pc).cloned() else {
                bail!("control ran past the last instruction");
            };
            pc += 1;

            match instruction {
                Instruction::LoadImmediate(dst, value) => self.set(dst, value as u32),
                Instruction::LoadAddress(dst, address) => {
                    let address = self.address(&address)?;
                    self.set(dst, address as u32);
                }
                Instruction::LoadWord(dst, address) => {
                    let value = self.load_word(self.address(&address)?);
                    self.set(dst, value);
                }
                Instruction::LoadByteUnsigned(dst, address) => {
                    let value = self.memory[self.address(&address)?];
                    self.set(dst, value as u32);
                }
                Instruction::StoreWord(src, address) => {
                    let address = self.address(&address)?;
                    let value = self.get(src);
                    self.memory[address..address + 4].copy_from_slice(&value.to_le_bytes());
                }
                Instruction::StoreByte(src, address) => {
                    let address = self.address(&address)?;
                    let value = self.get(src) as u8;
                    self.memory[address] = value;
                }
                Instruction::Move(dst, src) => self.arithmetic(dst, src, 0.into(), |a, _| a),
                Instruction::Negate(dst, src) => {
                    self.arithmetic(dst, src, 0.into(), |a, _| a.wrapping_neg())
                }
                Instruction::Not(dst, src) => self.arithmetic(dst, src, 0.into(), |a, _| !a),
                Instruction::Add(dst, a, b) => self.arithmetic(dst, a, b, u32::wrapping_add),
                Instruction::Sub(dst, a, b) => self.arithmetic(dst, a, b, u32::wrapping_sub),
                Instruction::Mul(dst, a, b) => self.arithmetic(dst, a, b, u32::wrapping_mul),
                Instruction::Div(dst, a, b) => {
                    if self.operand(b) == 0 {
                        bail!("division by zero");
                    }
                    self.arithmetic(dst, a, b, |a, b| a / b);
                }
                Instruction::And(dst, a, b) => self.arithmetic(dst, a, b, |a, b| a & b),
                Instruction::Or(dst, a, b) => self.arithmetic(dst, a, b, |a, b| a | b),
                Instruction::Xor(dst, a, b) => self.arithmetic(dst, a, b, |a, b| a ^ b),

                Instruction::Branch(label) => pc = self.label(&label)?,
                Instruction::BranchEq(a, b, label) => {
                    pc = self.branch(a, b, &label, |a, b| a == b)?.unwrap_or(pc)
                }
                Instruction::BranchNe(a, b, label) => {
                    pc = self.branch(a, b, &label, |a, b| a != b)?.unwrap_or(pc)
                }
                Instruction::BranchGt(a, b, label) => {
                    pc = self.branch(a, b, &label, |a, b| a > b)?.unwrap_or(pc)
                }
                Instruction::BranchGe(a, b, label) => {
                    pc = self.branch(a, b, &label, |a, b| a >= b)?.unwrap_or(pc)
                }
                Instruction::BranchLt(a, b, label) => {
                    pc = self.branch(a, b, &label, |a, b| a < b)?.unwrap_or(pc)
                }
                Instruction::BranchLe(a, b, label) => {
                    pc = self.branch(a, b, &label, |a, b| a <= b)?.unwrap_or(pc)
                }
                Instruction::BranchLtZero(a, label) => {
                    pc = self.branch(a, 0.into(), &label, |a, b| a < b)?.unwrap_or(pc)
                }

                Instruction::Jump(label) => match self.labels.get(&label).copied() {
                    Some(target) => pc = target,
                    None => {
                        if let Some(exit) = self.runtime(&label)? {
                            return Ok(exit);
                        }
                        pc = self.get(Register::Ra) as usize;
                    }
                },
                Instruction::JumpAndLink(label) => {
                    self.set(Register::Ra, pc as u32);
                    match self.labels.get(&label).copied() {
                        Some(target) => pc = target,
                        None => {
                            if let Some(exit) = self.runtime(&label)? {
                                return Ok(exit);
                            }
                        }
                    }
                }
                Instruction::JumpRegister(register) => pc = self.get(register) as usize,

                // Labels, comments and directives.
                _ => {}
            }
        }

        bail!("program did not stop within {STEP_LIMIT} steps")
    }
}

pub fn num(value: i32) -> Expression {
    ValueExpression::constant(value, Location::default()).into()
}

pub fn var(name: &str) -> Expression {
    ValueExpression::variable(name, Location::default()).into()
}

pub fn bin(op: &str, left: Expression, right: Expression) -> Expression {
    ValueExpression::binary(op, left, right).into()
}

pub fn unary(op: &str, operand: Expression) -> Expression {
    ValueExpression::unary(op, operand, Location::default()).into()
}

pub fn rel(op: &str, left: Expression, right: Expression) -> Expression {
    BooleanExpression::relational(op, left, right).into()
}

pub fn logic(op: &str, left: Expression, right: Expression) -> Expression {
    BooleanExpression::binary(op, left, right).into()
}

pub fn not(operand: Expression) -> Expression {
    BooleanExpression::unary("!", operand, Location::default()).into()
}

pub fn index(name: &str, index: Expression) -> Expression {
    ValueExpression::array_access(name, index, Location::default()).into()
}

pub fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    ValueExpression::call(name, arguments, Location::default()).into()
}

pub fn assignment(name: &str, value: Expression) -> Expression {
    ValueExpression::assignment(LValue::variable(name, Location::default()), value).into()
}

pub fn assign(name: &str, value: Expression) -> Statement {
    Statement::expression(assignment(name, value))
}

pub fn assign_element(name: &str, index: Expression, value: Expression) -> Statement {
    Statement::expression(ValueExpression::assignment(
        LValue::array_access(name, index, Location::default()),
        value,
    ))
}

pub fn declare(name: &str, ty: SymbolType) -> Statement {
    Statement::declaration(name, ty, Location::default())
}

pub fn block(statements: Vec<Statement>) -> StatementBlock {
    StatementBlock::new(statements, Location::default())
}

pub fn if_else(condition: Expression, then: Vec<Statement>, otherwise: Vec<Statement>) -> Statement {
    Statement::if_else(condition, block(then), Some(block(otherwise)), Location::default())
}

pub fn while_loop(condition: Expression, body: Vec<Statement>) -> Statement {
    Statement::while_loop(condition, block(body), Location::default())
}

/// `for (int name = from; name < to; name = name + 1) body`
pub fn count(name: &str, from: i32, to: i32, body: Vec<Statement>) -> Statement {
    Statement::for_loop(
        vec![declare(name, SymbolType::INT), assign(name, num(from))],
        rel("<", var(name), num(to)),
        assignment(name, bin("+", var(name), num(1))),
        block(body),
        Location::default(),
    )
}

pub fn brk() -> Statement {
    Statement::Break(Location::default())
}

pub fn cont() -> Statement {
    Statement::Continue(Location::default())
}

pub fn ret(value: Option<Expression>) -> Statement {
    Statement::return_value(value, Location::default())
}

pub fn print_int(value: Expression) -> Statement {
    Statement::expression(call("print_int", vec![value]))
}

pub fn print_char(value: char) -> Statement {
    Statement::expression(call("print_char", vec![num(value as i32)]))
}

pub fn parameter(name: &str, ty: SymbolType) -> Spanned<Declaration> {
    Spanned::new(
        Declaration {
            name: name.into(),
            ty,
        },
        Location::default(),
    )
}

pub fn function(
    name: &str,
    return_type: SymbolType,
    parameters: Vec<Spanned<Declaration>>,
    body: Vec<Statement>,
) -> Definition {
    Definition::function(name, return_type, parameters, block(body), Location::default())
}

pub fn void_main(body: Vec<Statement>) -> Program {
    Program::new(vec![Definition::main(
        SymbolType::Void,
        block(body),
        Location::default(),
    )])
}
