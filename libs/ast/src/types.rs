/// Types a scalar storage cell can hold.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    Int,
    Char,
}

impl ValueType {
    pub fn width(self) -> u32 {
        match self {
            ValueType::Int => 4,
            ValueType::Char => 1,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Char => write!(f, "char"),
        }
    }
}

/// The type of a symbol: a scalar value, an array of values, a reference to
/// values (parameters receiving an array, string constants), or `void`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SymbolType {
    Void,
    Value(ValueType),
    Array(ValueType, u32),
    Pointer(ValueType),
}

impl SymbolType {
    pub const INT: SymbolType = SymbolType::Value(ValueType::Int);
    pub const CHAR: SymbolType = SymbolType::Value(ValueType::Char);

    /// Whether a value of this type fits in a register and can take part in
    /// arithmetic.
    pub fn is_value(&self) -> bool {
        matches!(self, SymbolType::Value(_))
    }

    pub fn width(&self) -> u32 {
        match self {
            SymbolType::Void => 0,
            SymbolType::Value(value) => value.width(),
            SymbolType::Array(element, size) => element.width().saturating_mul(*size),
            SymbolType::Pointer(_) => 4,
        }
    }

    /// Width in bytes, or `None` when it does not fit a signed 32-bit offset.
    pub fn checked_width(&self) -> Option<u32> {
        let width = match self {
            SymbolType::Array(element, size) => element.width().checked_mul(*size)?,
            _ => self.width(),
        };
        (width <= i32::MAX as u32).then_some(width)
    }

    /// Width rounded up to the machine word.
    pub fn aligned_width(&self) -> u32 {
        self.width().saturating_add(3) & !3
    }

    /// Element type of an indexable symbol.
    pub fn element(&self) -> Option<ValueType> {
        match self {
            SymbolType::Array(element, _) | SymbolType::Pointer(element) => Some(*element),
            _ => None,
        }
    }

    /// Whether an argument of type `other` may be passed to a parameter of
    /// this type.
    pub fn compatible_with(&self, other: &SymbolType) -> bool {
        match (self, other) {
            (SymbolType::Value(_), SymbolType::Value(_)) => true,
            (SymbolType::Array(..), _) => self == other,
            (SymbolType::Pointer(element), SymbolType::Pointer(other))
            | (SymbolType::Pointer(element), SymbolType::Array(other, _)) => {
                element.width() == other.width()
            }
            _ => false,
        }
    }
}

impl From<ValueType> for SymbolType {
    fn from(value: ValueType) -> Self {
        SymbolType::Value(value)
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolType::Void => write!(f, "void"),
            SymbolType::Value(value) => write!(f, "{value}"),
            SymbolType::Array(element, size) => write!(f, "{element}[{size}]"),
            SymbolType::Pointer(element) => write!(f, "{element}*"),
        }
    }
}
