//! Closed tag tables shared with the engine. The numeric values are part of
//! the protocol and must never be renumbered.

use crate::error::WireError;

/// Declares a `#[repr(u8)]` enum together with its tag conversions.
macro_rules! wire_enum {
    ($(#[$attr:meta])* $what:literal, $name:ident { $($variant:ident = $tag:literal => $label:literal),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $tag),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn tag(self) -> u8 {
                self as u8
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.tag()
            }
        }

        impl TryFrom<u8> for $name {
            type Error = WireError;

            fn try_from(tag: u8) -> Result<Self, Self::Error> {
                match tag {
                    $($tag => Ok($name::$variant),)+
                    _ => Err(WireError::InvalidTag { what: $what, tag }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

wire_enum! {
    /// First byte of every record after the last-block header.
    "opcode", Opcode {
        Unknown = 0 => "UNKNOWN",
        UnOp = 1 => "UN_OP",
        BinOp = 2 => "BIN_OP",
        Call = 3 => "CALL",
        CallBuiltin = 4 => "CALL_BUILTIN",
        ChangeInterface = 5 => "CHANGE_INTERFACE",
        ChangeType = 6 => "CHANGE_TYPE",
        Convert = 7 => "CONVERT",
        SliceToArrayPointer = 8 => "SLICE_TO_ARRAY_POINTER",
        MakeInterface = 9 => "MAKE_INTERFACE",
        Store = 10 => "STORE",
        If = 11 => "IF",
        Jump = 12 => "JUMP",
        Defer = 13 => "DEFER",
        Alloc = 14 => "ALLOC",
        MakeSlice = 15 => "MAKE_SLICE",
        MakeMap = 16 => "MAKE_MAP",
        Extract = 17 => "EXTRACT",
        Slice = 18 => "SLICE",
        Return = 19 => "RETURN",
        RunDefers = 20 => "RUN_DEFERS",
        Panic = 21 => "PANIC",
        Variable = 22 => "VARIABLE",
        Range = 23 => "RANGE",
        Next = 24 => "NEXT",
        FieldAddr = 25 => "FIELD_ADDR",
        Field = 26 => "FIELD",
        IndexAddr = 27 => "INDEX_ADDR",
        Index = 28 => "INDEX",
        Lookup = 29 => "LOOKUP",
        MapUpdate = 30 => "MAP_UPDATE",
        TypeAssert = 31 => "TYPE_ASSERT",
        MakeClosure = 32 => "MAKE_CLOSURE",
        Noop = 33 => "NOOP",
    }
}

wire_enum! {
    /// Discriminant written before every operand.
    "value kind", ValueKind {
        Illegal = 0 => "ILLEGAL",
        Const = 1 => "CONST",
        Parameter = 2 => "PARAMETER",
        FreeVariable = 3 => "FREE_VARIABLE",
        Local = 4 => "LOCAL",
    }
}

wire_enum! {
    /// The closed set of shapes the engine understands.
    "sort", Sort {
        Unknown = 0 => "UNKNOWN",
        Void = 1 => "VOID",
        Bool = 2 => "BOOL",
        Int8 = 3 => "INT8",
        Int16 = 4 => "INT16",
        Int32 = 5 => "INT32",
        Int64 = 6 => "INT64",
        Uint8 = 7 => "UINT8",
        Uint16 = 8 => "UINT16",
        Uint32 = 9 => "UINT32",
        Uint64 = 10 => "UINT64",
        Float32 = 11 => "FLOAT32",
        Float64 = 12 => "FLOAT64",
        String = 13 => "STRING",
        Array = 14 => "ARRAY",
        Slice = 15 => "SLICE",
        Map = 16 => "MAP",
        Struct = 17 => "STRUCT",
        Interface = 18 => "INTERFACE",
        Pointer = 19 => "POINTER",
        Tuple = 20 => "TUPLE",
    }
}

wire_enum! {
    "unary operator", UnaryOperator {
        Illegal = 0 => "ILLEGAL",
        Recv = 1 => "<-",
        Neg = 2 => "-",
        Deref = 3 => "*",
        Not = 4 => "!",
        Inv = 5 => "^",
    }
}

impl UnaryOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|op| *op != UnaryOperator::Illegal)
            .find(|op| op.name() == token)
    }
}

wire_enum! {
    "binary operator", BinaryOperator {
        Illegal = 0 => "ILLEGAL",
        Add = 1 => "+",
        Sub = 2 => "-",
        Mul = 3 => "*",
        Div = 4 => "/",
        Rem = 5 => "%",
        And = 6 => "&",
        Or = 7 => "|",
        Xor = 8 => "^",
        Shl = 9 => "<<",
        Shr = 10 => ">>",
        AndNot = 11 => "&^",
        Eq = 12 => "==",
        Lt = 13 => "<",
        Gt = 14 => ">",
        Neq = 15 => "!=",
        Le = 16 => "<=",
        Ge = 17 => ">=",
    }
}

impl BinaryOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|op| *op != BinaryOperator::Illegal)
            .find(|op| op.name() == token)
    }
}

wire_enum! {
    /// Language builtins reachable through `CALL_BUILTIN`.
    "builtin", Builtin {
        Unknown = 0 => "unknown",
        Append = 1 => "append",
        Copy = 2 => "copy",
        Close = 3 => "close",
        Delete = 4 => "delete",
        Print = 5 => "print",
        Println = 6 => "println",
        Len = 7 => "len",
        Cap = 8 => "cap",
        Min = 9 => "min",
        Max = 10 => "max",
        Real = 11 => "real",
        Imag = 12 => "imag",
        Complex = 13 => "complex",
        Panic = 14 => "panic",
        Recover = 15 => "recover",
        WrapNilCheck = 16 => "ssa:wrapnilchk",
    }
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|builtin| *builtin != Builtin::Unknown)
            .find(|builtin| builtin.name() == name)
    }

    /// `append` and `copy` carry the element sort of their slice operand.
    pub const fn carries_element_sort(self) -> bool {
        matches!(self, Builtin::Append | Builtin::Copy)
    }
}
