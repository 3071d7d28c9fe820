use std::collections::HashMap;

use gb_ssa::{FuncId, InstrRef, TypeId, TypeTable};
use gb_wire::Handle;

/// Anything the engine can hold a handle to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Instruction(InstrRef),
    Function(FuncId),
    /// Types are interned by canonical spelling, so the id is the content key.
    Type(TypeId),
    /// An interface method as named by a dynamic call.
    Method { iface: TypeId, name: String },
}

/// Append-only table mapping graph nodes to handles and back.
///
/// Handle `n` names `nodes[n - 1]`; zero stays free for [`Handle::NONE`].
#[derive(Debug, Default)]
pub struct HandleRegistry {
    nodes: Vec<Node>,
    index: HashMap<Node, Handle>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the existing handle of `node` or assigns the next one.
    pub fn register(&mut self, node: Node) -> Handle {
        if let Some(handle) = self.index.get(&node) {
            return *handle;
        }
        self.nodes.push(node.clone());
        let handle = Handle::new(self.nodes.len() as u64);
        self.index.insert(node, handle);
        handle
    }

    pub fn resolve(&self, handle: Handle) -> Option<&Node> {
        let raw = handle.raw();
        if raw == 0 {
            return None;
        }
        self.nodes.get((raw - 1) as usize)
    }

    pub fn instruction(&mut self, iref: InstrRef) -> Handle {
        self.register(Node::Instruction(iref))
    }

    pub fn function(&mut self, func: FuncId) -> Handle {
        self.register(Node::Function(func))
    }

    pub fn ty(&mut self, ty: TypeId) -> Handle {
        self.register(Node::Type(ty))
    }

    pub fn method(&mut self, iface: TypeId, name: impl Into<String>) -> Handle {
        self.register(Node::Method {
            iface,
            name: name.into(),
        })
    }

    pub fn resolve_instruction(&self, handle: Handle) -> Option<InstrRef> {
        match self.resolve(handle)? {
            Node::Instruction(iref) => Some(*iref),
            _ => None,
        }
    }

    pub fn resolve_function(&self, handle: Handle) -> Option<FuncId> {
        match self.resolve(handle)? {
            Node::Function(func) => Some(*func),
            _ => None,
        }
    }

    pub fn resolve_type(&self, handle: Handle) -> Option<TypeId> {
        match self.resolve(handle)? {
            Node::Type(ty) => Some(*ty),
            _ => None,
        }
    }

    pub fn resolve_method(&self, handle: Handle) -> Option<(TypeId, &str)> {
        match self.resolve(handle)? {
            Node::Method { iface, name } => Some((*iface, name.as_str())),
            _ => None,
        }
    }
}

/// 64-bit FNV-1a of a type's canonical spelling. The same spelling hashes
/// to the same value in every process and build.
pub fn type_hash(types: &TypeTable, ty: TypeId) -> i64 {
    fnv1a64(types.key(ty)) as i64
}

fn fnv1a64(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
