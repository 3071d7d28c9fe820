use std::collections::HashMap;

use derive_more::{Display, From, Into};
use itertools::Itertools;

use crate::instr::{Instruction, Value};
use crate::types::{BasicKind, Type, TypeId, TypeTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("F{_0}")]
pub struct FuncId(u32);

impl FuncId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable address of an instruction: function, block, position in block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{func}:{block}.{index}")]
pub struct InstrRef {
    pub func: FuncId,
    pub block: u32,
    pub index: u32,
}

impl InstrRef {
    pub fn new(func: FuncId, block: u32, index: u32) -> Self {
        Self { func, block, index }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub index: u32,
    pub comment: Option<String>,
    pub instrs: Vec<Instruction>,
    pub preds: Vec<u32>,
    /// For a block ending in `If`: 0 is the true branch, 1 the false branch.
    pub succs: Vec<u32>,
}

impl BasicBlock {
    pub fn first(&self) -> Option<&Instruction> {
        self.instrs.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: FuncId,
    pub name: String,
    pub params: Vec<Variable>,
    pub free_vars: Vec<Variable>,
    /// Result tuple.
    pub results: TypeId,
    pub signature: TypeId,
    pub blocks: Vec<BasicBlock>,
    pub recover: Option<u32>,
}

impl Function {
    pub fn block(&self, index: u32) -> Option<&BasicBlock> {
        self.blocks.get(index as usize)
    }

    /// First instruction of `block`, the handle target of a jump into it.
    pub fn block_entry(&self, index: u32) -> Option<InstrRef> {
        self.block(index)?.first().map(Instruction::id)
    }

    pub fn entry(&self) -> Option<InstrRef> {
        self.block_entry(0)
    }

    pub fn recover_entry(&self) -> Option<InstrRef> {
        self.recover.and_then(|index| self.block_entry(index))
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.blocks.iter().flat_map(|block| block.instrs.iter())
    }
}

/// One linked package: functions and the types they mention. Immutable
/// after loading.
#[derive(Debug, Clone)]
pub struct Program {
    pub package: String,
    types: TypeTable,
    functions: Vec<Function>,
    function_index: HashMap<String, FuncId>,
}

impl Program {
    pub fn new(package: impl Into<String>, types: TypeTable, functions: Vec<Function>) -> Self {
        let function_index = functions
            .iter()
            .map(|function| (function.name.clone(), function.id))
            .collect();
        Self {
            package: package.into(),
            types,
            functions,
            function_index,
        }
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    pub fn lookup_function(&self, name: &str) -> Option<FuncId> {
        self.function_index.get(name).copied()
    }

    pub fn block(&self, iref: InstrRef) -> Option<&BasicBlock> {
        self.function(iref.func)?.block(iref.block)
    }

    pub fn instruction(&self, iref: InstrRef) -> Option<&Instruction> {
        self.block(iref)?.instrs.get(iref.index as usize)
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.functions.iter().flat_map(Function::instructions)
    }

    /// Static type of `value` as seen from inside `func`.
    pub fn value_type(&self, func: FuncId, value: &Value) -> TypeId {
        let invalid = self.types.basic(BasicKind::Invalid);
        let function = self.function(func);
        match value {
            Value::Const(constant) => constant.ty,
            Value::Parameter(index) => function
                .and_then(|function| function.params.get(*index as usize))
                .map_or(invalid, |param| param.ty),
            Value::FreeVar(index) => function
                .and_then(|function| function.free_vars.get(*index as usize))
                .map_or(invalid, |var| var.ty),
            Value::Register(iref) => self
                .instruction(*iref)
                .and_then(Instruction::result_type)
                .unwrap_or_else(|| self.types.void()),
            Value::Function(id) => self.function(*id).map_or(invalid, |target| target.signature),
            Value::Builtin(_) => invalid,
        }
    }

    /// Source-like rendering of `value`, used where an operand has to be
    /// described rather than referenced.
    pub fn value_text(&self, func: FuncId, value: &Value) -> String {
        let function = self.function(func);
        match value {
            Value::Const(constant) => constant.literal.to_string(),
            Value::Parameter(index) => function
                .and_then(|function| function.params.get(*index as usize))
                .map_or_else(|| format!("param{index}"), |param| param.name.clone()),
            Value::FreeVar(index) => function
                .and_then(|function| function.free_vars.get(*index as usize))
                .map_or_else(|| format!("free{index}"), |var| var.name.clone()),
            Value::Register(iref) => self
                .instruction(*iref)
                .and_then(Instruction::register)
                .map_or_else(|| iref.to_string(), |register| register.name.clone()),
            Value::Function(id) => self
                .function(*id)
                .map_or_else(|| id.to_string(), |target| target.name.clone()),
            Value::Builtin(builtin) => builtin.name().to_string(),
        }
    }

    /// Concrete implementations of `method` for every named type whose
    /// method set (value or pointer) satisfies `iface`.
    pub fn implementations(&self, iface: TypeId, method: &str) -> Vec<FuncId> {
        let types = &self.types;
        if !types.is_interface(iface) {
            return vec![];
        }
        let wanted = types.method_set(iface);
        types
            .iter()
            .filter(|(id, _)| !types.is_interface(*id))
            .filter_map(|(_, ty)| match ty {
                Type::Named { methods, .. } => Some(methods),
                _ => None,
            })
            .filter(|methods| {
                wanted.iter().all(|want| {
                    methods.iter().any(|have| {
                        have.name == want.name && types.identical(have.signature, want.signature)
                    })
                })
            })
            .filter_map(|methods| {
                methods
                    .iter()
                    .find(|have| have.name == method)
                    .and_then(|have| have.function)
            })
            .sorted()
            .dedup()
            .collect()
    }
}
