//! Serialized form of one package as handed over by the SSA front-end.
//!
//! Types are referenced by their canonical Go spelling, registers and
//! functions by name. [`crate::loader`] links a [`ProgramDoc`] into a
//! [`crate::Program`].

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramDoc {
    pub package: String,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDoc>,
}

/// A named type (`underlying`), an alias (`alias_of`) or a type parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default)]
    pub alias_of: Option<String>,
    #[serde(default)]
    pub type_param: bool,
    #[serde(default)]
    pub methods: Vec<MethodDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDoc {
    pub name: String,
    /// Signature without the receiver.
    pub signature: String,
    #[serde(default)]
    pub pointer_receiver: bool,
    /// Name of the implementing function, absent for abstract methods.
    #[serde(default)]
    pub function: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VarDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDoc {
    pub name: String,
    #[serde(default)]
    pub params: Vec<VarDoc>,
    #[serde(default)]
    pub free_vars: Vec<VarDoc>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub blocks: Vec<BlockDoc>,
    #[serde(default)]
    pub recover: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockDoc {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Derived from the successor lists when absent.
    #[serde(default)]
    pub preds: Option<Vec<u32>>,
    #[serde(default)]
    pub succs: Vec<u32>,
    #[serde(default)]
    pub instrs: Vec<InstrDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum ValueDoc {
    Const {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    Parameter {
        index: u32,
    },
    FreeVar {
        index: u32,
    },
    Register {
        name: String,
    },
    Function {
        name: String,
    },
    Builtin {
        name: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallDoc {
    pub callee: ValueDoc,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub args: Vec<ValueDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op")]
pub enum OpDoc {
    UnOp {
        operator: String,
        x: ValueDoc,
        #[serde(default)]
        comma_ok: bool,
    },
    BinOp {
        operator: String,
        x: ValueDoc,
        y: ValueDoc,
    },
    Call(CallDoc),
    ChangeInterface {
        x: ValueDoc,
    },
    ChangeType {
        x: ValueDoc,
    },
    Convert {
        x: ValueDoc,
    },
    MultiConvert {
        x: ValueDoc,
    },
    SliceToArrayPointer {
        x: ValueDoc,
    },
    MakeInterface {
        x: ValueDoc,
    },
    Extract {
        tuple: ValueDoc,
        index: u32,
    },
    Slice {
        x: ValueDoc,
        #[serde(default)]
        low: Option<ValueDoc>,
        #[serde(default)]
        high: Option<ValueDoc>,
        #[serde(default)]
        max: Option<ValueDoc>,
    },
    Return {
        #[serde(default)]
        results: Vec<ValueDoc>,
    },
    RunDefers,
    Panic {
        x: ValueDoc,
    },
    Send {
        chan: ValueDoc,
        x: ValueDoc,
    },
    Store {
        addr: ValueDoc,
        value: ValueDoc,
    },
    If {
        cond: ValueDoc,
    },
    Jump,
    Defer(CallDoc),
    Go(CallDoc),
    MakeChan {
        size: ValueDoc,
    },
    Alloc {
        #[serde(default)]
        heap: bool,
    },
    MakeSlice {
        len: ValueDoc,
        cap: ValueDoc,
    },
    MakeMap {
        #[serde(default)]
        reserve: Option<ValueDoc>,
    },
    Range {
        x: ValueDoc,
    },
    Next {
        iter: ValueDoc,
        #[serde(default)]
        is_string: bool,
    },
    FieldAddr {
        x: ValueDoc,
        field: u32,
    },
    Field {
        x: ValueDoc,
        field: u32,
    },
    IndexAddr {
        x: ValueDoc,
        index: ValueDoc,
    },
    Index {
        x: ValueDoc,
        index: ValueDoc,
    },
    Lookup {
        x: ValueDoc,
        key: ValueDoc,
        #[serde(default)]
        comma_ok: bool,
    },
    MapUpdate {
        map: ValueDoc,
        key: ValueDoc,
        value: ValueDoc,
    },
    TypeAssert {
        x: ValueDoc,
        asserted: String,
        #[serde(default)]
        comma_ok: bool,
    },
    MakeClosure {
        func: String,
        #[serde(default)]
        bindings: Vec<ValueDoc>,
    },
    Phi {
        edges: Vec<ValueDoc>,
    },
    Select {
        #[serde(default)]
        states: Vec<ValueDoc>,
        #[serde(default)]
        blocking: bool,
    },
    DebugRef {
        x: ValueDoc,
    },
    #[serde(other)]
    Unsupported,
}

/// One instruction: the shared header fields plus the operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct InstrDoc {
    pub op_name: String,
    pub register: Option<String>,
    pub ty: Option<String>,
    pub pos: Option<String>,
    pub op: OpDoc,
}

fn string_field(
    object: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<Option<String>, String> {
    match object.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(format!("`{key}` must be a string, found {other}")),
    }
}

impl TryFrom<serde_json::Value> for InstrDoc {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let object = value
            .as_object()
            .ok_or_else(|| "instruction must be an object".to_string())?;
        let op_name =
            string_field(object, "op")?.ok_or_else(|| "instruction without `op`".to_string())?;
        let register = string_field(object, "register")?;
        let ty = string_field(object, "type")?;
        let pos = string_field(object, "pos")?;
        let op = OpDoc::deserialize(&value).map_err(|err| format!("{op_name}: {err}"))?;
        Ok(Self {
            op_name,
            register,
            ty,
            pos,
            op,
        })
    }
}
