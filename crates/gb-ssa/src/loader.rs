use std::collections::HashMap;

use eyre::WrapErr;
use gb_wire::{BinaryOperator, Builtin, UnaryOperator};
use tracing::debug;

use crate::document::{BlockDoc, CallDoc, FunctionDoc, InstrDoc, OpDoc, ProgramDoc, ValueDoc, VarDoc};
use crate::error::{LoadError, LoadResult};
use crate::instr::{CallCommon, Const, InstrHeader, InstrKind, Instruction, Literal, Register, Value};
use crate::program::{BasicBlock, FuncId, Function, InstrRef, Program, Variable};
use crate::type_expr::parse_type;
use crate::types::{Method, Type, TypeId, TypeTable};

/// Turns front-end output into a linked [`Program`].
pub trait ProgramLoader {
    fn load(&self, source: &[u8]) -> eyre::Result<Program>;
}

/// Loads the JSON program document.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLoader;

impl ProgramLoader for JsonLoader {
    fn load(&self, source: &[u8]) -> eyre::Result<Program> {
        let doc: ProgramDoc =
            serde_json::from_slice(source).wrap_err("failed to parse program document")?;
        let package = doc.package.clone();
        let program = link(doc).wrap_err_with(|| format!("failed to link package {package}"))?;
        debug!(
            package = %program.package,
            functions = program.functions().len(),
            types = program.types().len(),
            "program loaded"
        );
        Ok(program)
    }
}

/// Resolves every name in `doc` and checks the graph invariants the
/// translator relies on.
pub fn link(doc: ProgramDoc) -> LoadResult<Program> {
    let mut types = TypeTable::new();

    let mut declared = Vec::with_capacity(doc.types.len());
    for decl in &doc.types {
        let id = match (&decl.underlying, &decl.alias_of, decl.type_param) {
            (Some(_), None, false) => types.declare_named(&decl.name)?,
            (None, Some(_), false) => types.declare_alias(&decl.name)?,
            (None, None, true) => types.declare_type_param(&decl.name)?,
            _ => {
                return Err(LoadError::document(format!(
                    "type `{}` needs exactly one of `underlying`, `alias_of` or `type_param`",
                    decl.name
                )))
            }
        };
        declared.push(id);
    }

    let mut function_ids = HashMap::new();
    for (index, function) in doc.functions.iter().enumerate() {
        if function_ids
            .insert(function.name.clone(), FuncId::from(index as u32))
            .is_some()
        {
            return Err(LoadError::DuplicateFunction {
                name: function.name.clone(),
            });
        }
    }

    for (decl, id) in doc.types.iter().zip(declared) {
        if let Some(target) = &decl.alias_of {
            let target = parse_type(&mut types, target)?;
            types.define_alias(id, target);
            continue;
        }
        let Some(underlying) = &decl.underlying else {
            continue;
        };
        let underlying = parse_type(&mut types, underlying)?;
        let mut methods = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            let signature = parse_type(&mut types, &method.signature)?;
            if !matches!(types.get(signature), Type::Signature { .. }) {
                return Err(LoadError::link(
                    &decl.name,
                    format!("method {} has non-function type {}", method.name, method.signature),
                ));
            }
            let function = match &method.function {
                Some(name) => Some(function_ids.get(name).copied().ok_or_else(|| {
                    LoadError::link(
                        &decl.name,
                        format!("method {} refers to unknown function `{name}`", method.name),
                    )
                })?),
                None => None,
            };
            methods.push(Method {
                name: method.name.clone(),
                signature,
                pointer_receiver: method.pointer_receiver,
                function,
            });
        }
        types.define_named(id, underlying, methods);
    }

    let mut functions = Vec::with_capacity(doc.functions.len());
    for (index, function) in doc.functions.into_iter().enumerate() {
        let linker = FunctionLinker {
            types: &mut types,
            function_ids: &function_ids,
            id: FuncId::from(index as u32),
            name: function.name.clone(),
            params: 0,
            free_vars: 0,
            registers: HashMap::new(),
        };
        functions.push(linker.link(function)?);
    }

    check_closures(&functions)?;
    Ok(Program::new(doc.package, types, functions))
}

fn check_closures(functions: &[Function]) -> LoadResult<()> {
    for function in functions {
        for instr in function.instructions() {
            if let InstrKind::MakeClosure { func, bindings } = &instr.kind {
                let expected = functions
                    .get(func.index())
                    .map_or(0, |target| target.free_vars.len());
                if bindings.len() != expected {
                    return Err(LoadError::link(
                        &function.name,
                        format!(
                            "closure at {} binds {} values, target expects {expected}",
                            instr.id(),
                            bindings.len()
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

struct FunctionLinker<'a> {
    types: &'a mut TypeTable,
    function_ids: &'a HashMap<String, FuncId>,
    id: FuncId,
    name: String,
    params: usize,
    free_vars: usize,
    registers: HashMap<String, InstrRef>,
}

impl FunctionLinker<'_> {
    fn error(&self, message: impl Into<String>) -> LoadError {
        LoadError::link(&self.name, message)
    }

    fn ty(&mut self, text: &str) -> LoadResult<TypeId> {
        parse_type(self.types, text)
    }

    fn variables(&mut self, docs: &[VarDoc]) -> LoadResult<Vec<Variable>> {
        docs.iter()
            .map(|var| {
                Ok(Variable {
                    name: var.name.clone(),
                    ty: self.ty(&var.ty)?,
                })
            })
            .collect()
    }

    fn link(mut self, doc: FunctionDoc) -> LoadResult<Function> {
        let params = self.variables(&doc.params)?;
        let free_vars = self.variables(&doc.free_vars)?;
        self.params = params.len();
        self.free_vars = free_vars.len();

        let result_types = doc
            .results
            .iter()
            .map(|text| self.ty(text))
            .collect::<LoadResult<Vec<_>>>()?;
        let results = self.types.intern(Type::Tuple(result_types.clone()));
        if doc.variadic
            && !matches!(
                params.last().map(|param| self.types.get(param.ty)),
                Some(Type::Slice(_))
            )
        {
            return Err(self.error("variadic function must end in a slice parameter"));
        }
        let signature = self.types.intern(Type::Signature {
            params: params.iter().map(|param| param.ty).collect(),
            results: result_types,
            variadic: doc.variadic,
        });

        let (preds, succs) = self.edges(&doc.blocks)?;
        self.collect_registers(&doc.blocks)?;

        let mut blocks = Vec::with_capacity(doc.blocks.len());
        for (position, (block, (preds, succs))) in doc
            .blocks
            .into_iter()
            .zip(preds.into_iter().zip(succs))
            .enumerate()
        {
            blocks.push(self.block(position as u32, block, preds, succs)?);
        }

        if let Some(recover) = doc.recover {
            if recover as usize >= blocks.len() {
                return Err(self.error(format!("recover block {recover} does not exist")));
            }
        }

        Ok(Function {
            id: self.id,
            name: self.name,
            params,
            free_vars,
            results,
            signature,
            blocks,
            recover: doc.recover,
        })
    }

    fn edges(&self, blocks: &[BlockDoc]) -> LoadResult<(Vec<Vec<u32>>, Vec<Vec<u32>>)> {
        let count = blocks.len();
        let mut derived = vec![Vec::new(); count];
        for (position, block) in blocks.iter().enumerate() {
            if let Some(index) = block.index {
                if index as usize != position {
                    return Err(self.error(format!(
                        "block at position {position} claims index {index}"
                    )));
                }
            }
            for succ in &block.succs {
                if *succ as usize >= count {
                    return Err(self.error(format!(
                        "block {position} jumps to missing block {succ}"
                    )));
                }
                derived[*succ as usize].push(position as u32);
            }
        }
        let mut preds = Vec::with_capacity(count);
        for (position, (block, derived)) in blocks.iter().zip(derived).enumerate() {
            match &block.preds {
                Some(given) => {
                    if let Some(bad) = given.iter().find(|pred| **pred as usize >= count) {
                        return Err(self.error(format!(
                            "block {position} lists missing predecessor {bad}"
                        )));
                    }
                    preds.push(given.clone());
                }
                None => preds.push(derived),
            }
        }
        let succs = blocks.iter().map(|block| block.succs.clone()).collect();
        Ok((preds, succs))
    }

    fn collect_registers(&mut self, blocks: &[BlockDoc]) -> LoadResult<()> {
        for (block_index, block) in blocks.iter().enumerate() {
            for (index, instr) in block.instrs.iter().enumerate() {
                let Some(name) = &instr.register else {
                    continue;
                };
                let iref = InstrRef::new(self.id, block_index as u32, index as u32);
                if self.registers.insert(name.clone(), iref).is_some() {
                    return Err(self.error(format!("register {name} defined twice")));
                }
            }
        }
        Ok(())
    }

    fn block(
        &mut self,
        index: u32,
        doc: BlockDoc,
        preds: Vec<u32>,
        succs: Vec<u32>,
    ) -> LoadResult<BasicBlock> {
        if doc.instrs.is_empty() {
            return Err(self.error(format!("block {index} is empty")));
        }
        let last = doc.instrs.len() - 1;
        let mut instrs = Vec::with_capacity(doc.instrs.len());
        for (position, instr) in doc.instrs.into_iter().enumerate() {
            let iref = InstrRef::new(self.id, index, position as u32);
            let instr = self.instruction(iref, instr, preds.len())?;
            match &instr.kind {
                InstrKind::If { .. } | InstrKind::Jump if position != last => {
                    return Err(self.error(format!(
                        "{} at {iref} is not the last instruction of its block",
                        instr.kind.name()
                    )));
                }
                InstrKind::If { .. } if succs.len() != 2 => {
                    return Err(self.error(format!(
                        "block {index} ends in If but has {} successors",
                        succs.len()
                    )));
                }
                InstrKind::Jump if succs.len() != 1 => {
                    return Err(self.error(format!(
                        "block {index} ends in Jump but has {} successors",
                        succs.len()
                    )));
                }
                _ => {}
            }
            instrs.push(instr);
        }
        Ok(BasicBlock {
            index,
            comment: doc.comment,
            instrs,
            preds,
            succs,
        })
    }

    fn instruction(&mut self, iref: InstrRef, doc: InstrDoc, pred_count: usize) -> LoadResult<Instruction> {
        let kind = self.kind(iref, &doc.op_name, doc.op, pred_count)?;
        let produces_result = match &kind {
            InstrKind::Unsupported { .. } => doc.register.is_some() && doc.ty.is_some(),
            kind => kind.defines_value(),
        };
        let register = if produces_result {
            let ty = match (&doc.ty, &kind) {
                (Some(text), _) => self.ty(text)?,
                (None, InstrKind::Call(_)) => self.types.void(),
                (None, _) => {
                    return Err(self.error(format!(
                        "{} at {iref} defines a value but has no type",
                        kind.name()
                    )))
                }
            };
            let name = doc
                .register
                .unwrap_or_else(|| format!("t{}.{}", iref.block, iref.index));
            Some(Register { name, ty })
        } else {
            None
        };
        Ok(Instruction {
            header: InstrHeader {
                id: iref,
                register,
                produces_result,
                pos: doc.pos,
            },
            kind,
        })
    }

    fn kind(&mut self, iref: InstrRef, op_name: &str, op: OpDoc, pred_count: usize) -> LoadResult<InstrKind> {
        let kind = match op {
            OpDoc::UnOp { operator, x, comma_ok } => InstrKind::UnOp {
                op: UnaryOperator::from_token(&operator)
                    .ok_or_else(|| self.error(format!("unknown unary operator `{operator}`")))?,
                x: self.value(&x)?,
                comma_ok,
            },
            OpDoc::BinOp { operator, x, y } => InstrKind::BinOp {
                op: BinaryOperator::from_token(&operator)
                    .ok_or_else(|| self.error(format!("unknown binary operator `{operator}`")))?,
                x: self.value(&x)?,
                y: self.value(&y)?,
            },
            OpDoc::Call(call) => InstrKind::Call(self.call(&call)?),
            OpDoc::ChangeInterface { x } => InstrKind::ChangeInterface { x: self.value(&x)? },
            OpDoc::ChangeType { x } => InstrKind::ChangeType { x: self.value(&x)? },
            OpDoc::Convert { x } => InstrKind::Convert { x: self.value(&x)? },
            OpDoc::MultiConvert { x } => InstrKind::MultiConvert { x: self.value(&x)? },
            OpDoc::SliceToArrayPointer { x } => InstrKind::SliceToArrayPointer { x: self.value(&x)? },
            OpDoc::MakeInterface { x } => InstrKind::MakeInterface { x: self.value(&x)? },
            OpDoc::Extract { tuple, index } => InstrKind::Extract {
                tuple: self.value(&tuple)?,
                index,
            },
            OpDoc::Slice { x, low, high, max } => InstrKind::Slice {
                x: self.value(&x)?,
                low: self.optional(low.as_ref())?,
                high: self.optional(high.as_ref())?,
                max: self.optional(max.as_ref())?,
            },
            OpDoc::Return { results } => InstrKind::Return {
                results: self.values(&results)?,
            },
            OpDoc::RunDefers => InstrKind::RunDefers,
            OpDoc::Panic { x } => InstrKind::Panic { x: self.value(&x)? },
            OpDoc::Send { chan, x } => InstrKind::Send {
                chan: self.value(&chan)?,
                x: self.value(&x)?,
            },
            OpDoc::Store { addr, value } => InstrKind::Store {
                addr: self.value(&addr)?,
                value: self.value(&value)?,
            },
            OpDoc::If { cond } => InstrKind::If {
                cond: self.value(&cond)?,
            },
            OpDoc::Jump => InstrKind::Jump,
            OpDoc::Defer(call) => InstrKind::Defer(self.call(&call)?),
            OpDoc::Go(call) => InstrKind::Go(self.call(&call)?),
            OpDoc::MakeChan { size } => InstrKind::MakeChan {
                size: self.value(&size)?,
            },
            OpDoc::Alloc { heap } => InstrKind::Alloc { heap },
            OpDoc::MakeSlice { len, cap } => InstrKind::MakeSlice {
                len: self.value(&len)?,
                cap: self.value(&cap)?,
            },
            OpDoc::MakeMap { reserve } => InstrKind::MakeMap {
                reserve: self.optional(reserve.as_ref())?,
            },
            OpDoc::Range { x } => InstrKind::Range { x: self.value(&x)? },
            OpDoc::Next { iter, is_string } => InstrKind::Next {
                iter: self.value(&iter)?,
                is_string,
            },
            OpDoc::FieldAddr { x, field } => InstrKind::FieldAddr {
                x: self.value(&x)?,
                field,
            },
            OpDoc::Field { x, field } => InstrKind::Field {
                x: self.value(&x)?,
                field,
            },
            OpDoc::IndexAddr { x, index } => InstrKind::IndexAddr {
                x: self.value(&x)?,
                index: self.value(&index)?,
            },
            OpDoc::Index { x, index } => InstrKind::Index {
                x: self.value(&x)?,
                index: self.value(&index)?,
            },
            OpDoc::Lookup { x, key, comma_ok } => InstrKind::Lookup {
                x: self.value(&x)?,
                key: self.value(&key)?,
                comma_ok,
            },
            OpDoc::MapUpdate { map, key, value } => InstrKind::MapUpdate {
                map: self.value(&map)?,
                key: self.value(&key)?,
                value: self.value(&value)?,
            },
            OpDoc::TypeAssert {
                x,
                asserted,
                comma_ok,
            } => InstrKind::TypeAssert {
                x: self.value(&x)?,
                asserted: self.ty(&asserted)?,
                comma_ok,
            },
            OpDoc::MakeClosure { func, bindings } => InstrKind::MakeClosure {
                func: self.function(&func)?,
                bindings: self.values(&bindings)?,
            },
            OpDoc::Phi { edges } => {
                if edges.len() != pred_count {
                    return Err(self.error(format!(
                        "phi at {iref} has {} edges for {pred_count} predecessors",
                        edges.len()
                    )));
                }
                InstrKind::Phi {
                    edges: self.values(&edges)?,
                }
            }
            OpDoc::Select { states, blocking } => InstrKind::Select {
                states: self.values(&states)?,
                blocking,
            },
            OpDoc::DebugRef { x } => InstrKind::DebugRef { x: self.value(&x)? },
            OpDoc::Unsupported => InstrKind::Unsupported {
                op: op_name.to_string(),
            },
        };
        Ok(kind)
    }

    fn call(&mut self, doc: &CallDoc) -> LoadResult<CallCommon> {
        Ok(CallCommon {
            callee: self.value(&doc.callee)?,
            method: doc.method.clone(),
            args: self.values(&doc.args)?,
        })
    }

    fn function(&self, name: &str) -> LoadResult<FuncId> {
        self.function_ids
            .get(name)
            .copied()
            .ok_or_else(|| self.error(format!("unknown function `{name}`")))
    }

    fn values(&mut self, docs: &[ValueDoc]) -> LoadResult<Vec<Value>> {
        docs.iter().map(|doc| self.value(doc)).collect()
    }

    fn optional(&mut self, doc: Option<&ValueDoc>) -> LoadResult<Option<Value>> {
        doc.map(|doc| self.value(doc)).transpose()
    }

    fn value(&mut self, doc: &ValueDoc) -> LoadResult<Value> {
        match doc {
            ValueDoc::Const { ty, value } => {
                let ty = self.ty(ty)?;
                let literal = self.literal(ty, value)?;
                Ok(Value::Const(Const { ty, literal }))
            }
            ValueDoc::Parameter { index } => {
                if *index as usize >= self.params {
                    return Err(self.error(format!("parameter {index} out of range")));
                }
                Ok(Value::Parameter(*index))
            }
            ValueDoc::FreeVar { index } => {
                if *index as usize >= self.free_vars {
                    return Err(self.error(format!("free variable {index} out of range")));
                }
                Ok(Value::FreeVar(*index))
            }
            ValueDoc::Register { name } => self
                .registers
                .get(name)
                .copied()
                .map(Value::Register)
                .ok_or_else(|| self.error(format!("unknown register {name}"))),
            ValueDoc::Function { name } => self.function(name).map(Value::Function),
            ValueDoc::Builtin { name } => Builtin::from_name(name)
                .map(Value::Builtin)
                .ok_or_else(|| self.error(format!("unknown builtin `{name}`"))),
        }
    }

    fn literal(&self, ty: TypeId, raw: &serde_json::Value) -> LoadResult<Literal> {
        use serde_json::Value as Json;

        let underlying = self.types.get(self.types.underlying(ty));
        match raw {
            Json::Null => Ok(Literal::Nil),
            Json::Bool(value) => Ok(Literal::Bool(*value)),
            Json::String(value) => Ok(Literal::Str(value.clone())),
            Json::Number(number) => match underlying {
                Type::Basic(kind) if kind.is_float() => number.as_f64().map(Literal::Float),
                Type::Basic(kind) if kind.is_unsigned() => number.as_u64().map(Literal::Uint),
                _ => number
                    .as_i64()
                    .map(Literal::Int)
                    .or_else(|| number.as_f64().map(Literal::Float)),
            }
            .ok_or_else(|| {
                self.error(format!(
                    "constant {number} does not fit {}",
                    self.types.key(ty)
                ))
            }),
            other => Err(self.error(format!("unsupported constant literal {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn load(doc: serde_json::Value) -> LoadResult<Program> {
        link(serde_json::from_value(doc).expect("fixture should deserialize"))
    }

    fn branchy() -> serde_json::Value {
        json!({
            "package": "main",
            "functions": [{
                "name": "main.f",
                "params": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
                "results": ["int"],
                "blocks": [
                    {"succs": [1, 2], "instrs": [
                        {"op": "BinOp", "register": "t0", "type": "bool", "operator": ">",
                         "x": {"kind": "Parameter", "index": 0},
                         "y": {"kind": "Parameter", "index": 1}},
                        {"op": "If", "cond": {"kind": "Register", "name": "t0"}}
                    ]},
                    {"instrs": [{"op": "Return", "results": [{"kind": "Parameter", "index": 0}]}]},
                    {"instrs": [{"op": "Return", "results": [{"kind": "Parameter", "index": 1}]}]}
                ]
            }]
        })
    }

    #[test]
    fn links_blocks_registers_and_edges() {
        let program = load(branchy()).expect("program should link");
        let f = program.lookup_function("main.f").expect("main.f exists");
        let function = program.function(f).unwrap();
        assert_eq!(program.types().key(function.signature), "func(int, int) int");
        assert_eq!(function.blocks[1].preds, vec![0]);
        assert_eq!(function.blocks[2].preds, vec![0]);

        let cond = &function.blocks[0].instrs[1];
        assert_eq!(
            cond.kind,
            InstrKind::If {
                cond: Value::Register(InstrRef::new(f, 0, 0))
            }
        );
        assert!(!cond.produces_result());
        assert!(function.blocks[0].instrs[0].produces_result());
    }

    #[test]
    fn if_needs_two_successors() {
        let mut doc = branchy();
        doc["functions"][0]["blocks"][0]["succs"] = json!([1]);
        let err = load(doc).unwrap_err();
        assert!(matches!(err, LoadError::Link { ref message, .. } if message.contains("If")));
    }

    #[test]
    fn phi_edges_must_match_predecessors() {
        let doc = json!({
            "package": "main",
            "functions": [{
                "name": "main.g",
                "params": [{"name": "c", "type": "bool"}],
                "results": ["int"],
                "blocks": [
                    {"succs": [1, 2], "instrs": [{"op": "If", "cond": {"kind": "Parameter", "index": 0}}]},
                    {"succs": [2], "instrs": [{"op": "Jump"}]},
                    {"instrs": [
                        {"op": "Phi", "register": "t0", "type": "int",
                         "edges": [{"kind": "Const", "type": "int", "value": 1}]},
                        {"op": "Return", "results": [{"kind": "Register", "name": "t0"}]}
                    ]}
                ]
            }]
        });
        let err = load(doc).unwrap_err();
        assert!(err.to_string().contains("2 predecessors"), "{err}");
    }

    #[test]
    fn unknown_names_are_link_errors() {
        let mut doc = branchy();
        doc["functions"][0]["blocks"][0]["instrs"][1]["cond"] = json!({"kind": "Register", "name": "t9"});
        assert!(load(doc).is_err());

        let mut doc = branchy();
        doc["functions"][0]["params"][0]["type"] = json!("main.Missing");
        assert_eq!(
            load(doc).unwrap_err(),
            LoadError::UnknownType {
                name: "main.Missing".to_string()
            }
        );
    }

    #[test]
    fn unknown_operations_survive_loading() {
        let doc = json!({
            "package": "main",
            "functions": [{
                "name": "main.h",
                "blocks": [{"instrs": [{"op": "Rotate"}, {"op": "Return"}]}]
            }]
        });
        let program = load(doc).expect("unknown ops load");
        let h = program.lookup_function("main.h").unwrap();
        let instr = program.instruction(InstrRef::new(h, 0, 0)).unwrap();
        assert_eq!(instr.kind, InstrKind::Unsupported { op: "Rotate".to_string() });
        assert!(!instr.produces_result());
    }

    #[test]
    fn methods_bind_to_functions() {
        let doc = json!({
            "package": "main",
            "types": [
                {"name": "main.Shape", "underlying": "interface{Area() float64}"},
                {"name": "main.Square", "underlying": "struct{S float64}",
                 "methods": [{"name": "Area", "signature": "func() float64", "function": "main.Square.Area"}]}
            ],
            "functions": [{
                "name": "main.Square.Area",
                "params": [{"name": "s", "type": "main.Square"}],
                "results": ["float64"],
                "blocks": [{"instrs": [{"op": "Return", "results": [{"kind": "Const", "type": "float64", "value": 1.5}]}]}]
            }]
        });
        let program = load(doc).expect("program should link");
        let shape = program.types().lookup("main.Shape").unwrap();
        let area = program.lookup_function("main.Square.Area").unwrap();
        assert_eq!(program.implementations(shape, "Area"), vec![area]);
    }

    #[test]
    fn json_loader_wraps_errors_with_context() {
        let err = JsonLoader.load(b"{not json").unwrap_err();
        assert!(format!("{err:?}").contains("failed to parse program document"));
    }
}
