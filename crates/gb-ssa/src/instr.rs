use gb_wire::{BinaryOperator, Builtin, UnaryOperator};

use crate::program::{FuncId, InstrRef};
use crate::types::TypeId;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Nil => f.write_str("nil"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Uint(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value}"),
            Literal::Str(value) => write!(f, "{value:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Const {
    pub ty: TypeId,
    pub literal: Literal,
}

/// An SSA operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Const(Const),
    Parameter(u32),
    FreeVar(u32),
    Register(InstrRef),
    /// Only meaningful as a call or closure target; elsewhere it stands for
    /// a nil value of the function's signature type.
    Function(FuncId),
    Builtin(Builtin),
}

impl Value {
    pub fn as_register(&self) -> Option<InstrRef> {
        match self {
            Value::Register(iref) => Some(*iref),
            _ => None,
        }
    }
}

/// Shared by `Call`, `Defer` and `Go`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallCommon {
    /// The function value, or the interface receiver of an `invoke`.
    pub callee: Value,
    /// Set for interface method invocations.
    pub method: Option<String>,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrHeader {
    pub id: InstrRef,
    pub register: Option<Register>,
    /// Whether the instruction defines an SSA value. Fixed at load time.
    pub produces_result: bool,
    pub pos: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    UnOp {
        op: UnaryOperator,
        x: Value,
        comma_ok: bool,
    },
    BinOp {
        op: BinaryOperator,
        x: Value,
        y: Value,
    },
    Call(CallCommon),
    ChangeInterface {
        x: Value,
    },
    ChangeType {
        x: Value,
    },
    Convert {
        x: Value,
    },
    MultiConvert {
        x: Value,
    },
    SliceToArrayPointer {
        x: Value,
    },
    MakeInterface {
        x: Value,
    },
    Extract {
        tuple: Value,
        index: u32,
    },
    Slice {
        x: Value,
        low: Option<Value>,
        high: Option<Value>,
        max: Option<Value>,
    },
    Return {
        results: Vec<Value>,
    },
    RunDefers,
    Panic {
        x: Value,
    },
    Send {
        chan: Value,
        x: Value,
    },
    Store {
        addr: Value,
        value: Value,
    },
    If {
        cond: Value,
    },
    Jump,
    Defer(CallCommon),
    Go(CallCommon),
    MakeChan {
        size: Value,
    },
    Alloc {
        heap: bool,
    },
    MakeSlice {
        len: Value,
        cap: Value,
    },
    MakeMap {
        reserve: Option<Value>,
    },
    Range {
        x: Value,
    },
    Next {
        iter: Value,
        is_string: bool,
    },
    FieldAddr {
        x: Value,
        field: u32,
    },
    Field {
        x: Value,
        field: u32,
    },
    IndexAddr {
        x: Value,
        index: Value,
    },
    Index {
        x: Value,
        index: Value,
    },
    Lookup {
        x: Value,
        key: Value,
        comma_ok: bool,
    },
    MapUpdate {
        map: Value,
        key: Value,
        value: Value,
    },
    TypeAssert {
        x: Value,
        asserted: TypeId,
        comma_ok: bool,
    },
    MakeClosure {
        func: FuncId,
        bindings: Vec<Value>,
    },
    Phi {
        edges: Vec<Value>,
    },
    Select {
        states: Vec<Value>,
        blocking: bool,
    },
    DebugRef {
        x: Value,
    },
    /// An operation this model has no variant for; kept so the failure
    /// surfaces when the instruction is requested, not at load time.
    Unsupported {
        op: String,
    },
}

impl InstrKind {
    pub fn name(&self) -> &str {
        match self {
            InstrKind::UnOp { .. } => "UnOp",
            InstrKind::BinOp { .. } => "BinOp",
            InstrKind::Call(_) => "Call",
            InstrKind::ChangeInterface { .. } => "ChangeInterface",
            InstrKind::ChangeType { .. } => "ChangeType",
            InstrKind::Convert { .. } => "Convert",
            InstrKind::MultiConvert { .. } => "MultiConvert",
            InstrKind::SliceToArrayPointer { .. } => "SliceToArrayPointer",
            InstrKind::MakeInterface { .. } => "MakeInterface",
            InstrKind::Extract { .. } => "Extract",
            InstrKind::Slice { .. } => "Slice",
            InstrKind::Return { .. } => "Return",
            InstrKind::RunDefers => "RunDefers",
            InstrKind::Panic { .. } => "Panic",
            InstrKind::Send { .. } => "Send",
            InstrKind::Store { .. } => "Store",
            InstrKind::If { .. } => "If",
            InstrKind::Jump => "Jump",
            InstrKind::Defer(_) => "Defer",
            InstrKind::Go(_) => "Go",
            InstrKind::MakeChan { .. } => "MakeChan",
            InstrKind::Alloc { .. } => "Alloc",
            InstrKind::MakeSlice { .. } => "MakeSlice",
            InstrKind::MakeMap { .. } => "MakeMap",
            InstrKind::Range { .. } => "Range",
            InstrKind::Next { .. } => "Next",
            InstrKind::FieldAddr { .. } => "FieldAddr",
            InstrKind::Field { .. } => "Field",
            InstrKind::IndexAddr { .. } => "IndexAddr",
            InstrKind::Index { .. } => "Index",
            InstrKind::Lookup { .. } => "Lookup",
            InstrKind::MapUpdate { .. } => "MapUpdate",
            InstrKind::TypeAssert { .. } => "TypeAssert",
            InstrKind::MakeClosure { .. } => "MakeClosure",
            InstrKind::Phi { .. } => "Phi",
            InstrKind::Select { .. } => "Select",
            InstrKind::DebugRef { .. } => "DebugRef",
            InstrKind::Unsupported { op } => op.as_str(),
        }
    }

    /// Operations that define an SSA register.
    pub fn defines_value(&self) -> bool {
        !matches!(
            self,
            InstrKind::Return { .. }
                | InstrKind::RunDefers
                | InstrKind::Panic { .. }
                | InstrKind::Send { .. }
                | InstrKind::Store { .. }
                | InstrKind::If { .. }
                | InstrKind::Jump
                | InstrKind::Defer(_)
                | InstrKind::Go(_)
                | InstrKind::MapUpdate { .. }
                | InstrKind::DebugRef { .. }
                | InstrKind::Unsupported { .. }
        )
    }

    pub fn call_common(&self) -> Option<&CallCommon> {
        match self {
            InstrKind::Call(call) | InstrKind::Defer(call) | InstrKind::Go(call) => Some(call),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub header: InstrHeader,
    pub kind: InstrKind,
}

impl Instruction {
    pub fn id(&self) -> InstrRef {
        self.header.id
    }

    pub fn produces_result(&self) -> bool {
        self.header.produces_result
    }

    pub fn register(&self) -> Option<&Register> {
        self.header.register.as_ref()
    }

    /// Type of the defined register, if any.
    pub fn result_type(&self) -> Option<TypeId> {
        self.header.register.as_ref().map(|register| register.ty)
    }
}
