//! Interned Go types and the relations between them.
//!
//! Every type is keyed by its canonical spelling (the way `go/types` prints
//! it, minus parameter names). Two structurally identical unnamed types
//! therefore share one [`TypeId`].

use std::collections::{HashMap, HashSet};

use derive_more::{Display, From, Into};
use itertools::Itertools;

use crate::error::{LoadError, LoadResult};
use crate::program::FuncId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("T{_0}")]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BasicKind {
    Invalid = 0,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const ALL: &'static [BasicKind] = &[
        BasicKind::Invalid,
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UnsafePointer,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    /// Resolves a predeclared spelling. `byte` and `rune` are the aliases
    /// `uint8` and `int32`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "byte" => Some(BasicKind::Uint8),
            "rune" => Some(BasicKind::Int32),
            _ => Self::ALL.iter().copied().find(|kind| kind.name() == name),
        }
    }

    pub const fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub const fn is_boolean(self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(
            self,
            BasicKind::Float32 | BasicKind::Float64 | BasicKind::UntypedFloat
        )
    }

    pub const fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub embedded: bool,
}

/// A method as seen through an interface or a method set.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub signature: TypeId,
}

/// A method declared on a named type.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub signature: TypeId,
    pub pointer_receiver: bool,
    pub function: Option<FuncId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic(BasicKind),
    Named {
        name: String,
        underlying: Option<TypeId>,
        methods: Vec<Method>,
    },
    Alias {
        name: String,
        target: Option<TypeId>,
    },
    Pointer(TypeId),
    Array {
        len: u64,
        elem: TypeId,
    },
    Slice(TypeId),
    Map {
        key: TypeId,
        elem: TypeId,
    },
    Chan {
        dir: ChanDir,
        elem: TypeId,
    },
    Struct(Vec<Field>),
    Interface {
        methods: Vec<MethodSig>,
        embedded: Vec<TypeId>,
    },
    Tuple(Vec<TypeId>),
    Signature {
        params: Vec<TypeId>,
        results: Vec<TypeId>,
        variadic: bool,
    },
    TypeParam(String),
}

#[derive(Debug, Clone)]
pub struct TypeTable {
    entries: Vec<Type>,
    keys: Vec<String>,
    index: HashMap<String, TypeId>,
    any: TypeId,
    void: TypeId,
    error: TypeId,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            entries: Vec::new(),
            keys: Vec::new(),
            index: HashMap::new(),
            any: TypeId(0),
            void: TypeId(0),
            error: TypeId(0),
        };
        for kind in BasicKind::ALL {
            table.intern(Type::Basic(*kind));
        }
        table.any = table.intern(Type::Interface {
            methods: vec![],
            embedded: vec![],
        });
        table.void = table.intern(Type::Tuple(vec![]));

        let string = table.basic(BasicKind::String);
        let error_method = table.intern(Type::Signature {
            params: vec![],
            results: vec![string],
            variadic: false,
        });
        let error_iface = table.intern(Type::Interface {
            methods: vec![MethodSig {
                name: "Error".to_string(),
                signature: error_method,
            }],
            embedded: vec![],
        });
        table.error = table.push(
            "error".to_string(),
            Type::Named {
                name: "error".to_string(),
                underlying: Some(error_iface),
                methods: vec![],
            },
        );
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, ty)| (TypeId(index as u32), ty))
    }

    pub fn contains(&self, id: TypeId) -> bool {
        id.index() < self.entries.len()
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.entries[id.index()]
    }

    /// Canonical spelling of `id`.
    pub fn key(&self, id: TypeId) -> &str {
        &self.keys[id.index()]
    }

    pub fn lookup(&self, key: &str) -> Option<TypeId> {
        self.index.get(key).copied()
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        TypeId(kind as u32)
    }

    /// The empty interface.
    pub fn any(&self) -> TypeId {
        self.any
    }

    /// The empty tuple.
    pub fn void(&self) -> TypeId {
        self.void
    }

    /// The predeclared `error` interface.
    pub fn error(&self) -> TypeId {
        self.error
    }

    pub fn intern(&mut self, ty: Type) -> TypeId {
        let ty = match ty {
            Type::Interface {
                mut methods,
                mut embedded,
            } => {
                methods.sort_by(|a, b| a.name.cmp(&b.name));
                embedded.sort_by(|a, b| self.key(*a).cmp(self.key(*b)));
                embedded.dedup();
                Type::Interface { methods, embedded }
            }
            other => other,
        };
        let key = self.render(&ty);
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        self.push(key, ty)
    }

    fn push(&mut self, key: String, ty: Type) -> TypeId {
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(ty);
        self.keys.push(key.clone());
        self.index.insert(key, id);
        id
    }

    /// Reserves a named type; its underlying type is filled in by
    /// [`TypeTable::define_named`] once every name is known.
    pub fn declare_named(&mut self, name: &str) -> LoadResult<TypeId> {
        self.declare(
            name,
            Type::Named {
                name: name.to_string(),
                underlying: None,
                methods: vec![],
            },
        )
    }

    pub fn declare_alias(&mut self, name: &str) -> LoadResult<TypeId> {
        self.declare(
            name,
            Type::Alias {
                name: name.to_string(),
                target: None,
            },
        )
    }

    pub fn declare_type_param(&mut self, name: &str) -> LoadResult<TypeId> {
        self.declare(name, Type::TypeParam(name.to_string()))
    }

    fn declare(&mut self, name: &str, ty: Type) -> LoadResult<TypeId> {
        if self.index.contains_key(name) || BasicKind::from_name(name).is_some() {
            return Err(LoadError::DuplicateType {
                name: name.to_string(),
            });
        }
        Ok(self.push(name.to_string(), ty))
    }

    pub fn define_named(&mut self, id: TypeId, underlying_ty: TypeId, new_methods: Vec<Method>) {
        let underlying_ty = self.underlying(underlying_ty);
        if let Type::Named {
            underlying,
            methods,
            ..
        } = &mut self.entries[id.index()]
        {
            *underlying = Some(underlying_ty);
            *methods = new_methods;
        }
    }

    pub fn define_alias(&mut self, id: TypeId, target_ty: TypeId) {
        if let Type::Alias { target, .. } = &mut self.entries[id.index()] {
            *target = Some(target_ty);
        }
    }

    fn render(&self, ty: &Type) -> String {
        match ty {
            Type::Basic(kind) => kind.name().to_string(),
            Type::Named { name, .. } | Type::Alias { name, .. } | Type::TypeParam(name) => {
                name.clone()
            }
            Type::Pointer(elem) => format!("*{}", self.key(*elem)),
            Type::Array { len, elem } => format!("[{len}]{}", self.key(*elem)),
            Type::Slice(elem) => format!("[]{}", self.key(*elem)),
            Type::Map { key, elem } => format!("map[{}]{}", self.key(*key), self.key(*elem)),
            Type::Chan { dir, elem } => match dir {
                ChanDir::Both => format!("chan {}", self.key(*elem)),
                ChanDir::Send => format!("chan<- {}", self.key(*elem)),
                ChanDir::Recv => format!("<-chan {}", self.key(*elem)),
            },
            Type::Struct(fields) => {
                let body = fields
                    .iter()
                    .map(|field| {
                        if field.embedded {
                            self.key(field.ty).to_string()
                        } else {
                            format!("{} {}", field.name, self.key(field.ty))
                        }
                    })
                    .join("; ");
                format!("struct{{{body}}}")
            }
            Type::Interface { methods, embedded } => {
                let body = embedded
                    .iter()
                    .map(|id| self.key(*id).to_string())
                    .chain(methods.iter().map(|method| {
                        format!("{}{}", method.name, self.signature_tail(method.signature))
                    }))
                    .join("; ");
                format!("interface{{{body}}}")
            }
            Type::Tuple(elems) => {
                format!("({})", elems.iter().map(|id| self.key(*id)).join(", "))
            }
            Type::Signature {
                params,
                results,
                variadic,
            } => format!("func{}", self.render_tail(params, results, *variadic)),
        }
    }

    fn signature_tail(&self, signature: TypeId) -> String {
        match self.get(signature) {
            Type::Signature {
                params,
                results,
                variadic,
            } => self.render_tail(params, results, *variadic),
            _ => "()".to_string(),
        }
    }

    fn render_tail(&self, params: &[TypeId], results: &[TypeId], variadic: bool) -> String {
        let last = params.len().saturating_sub(1);
        let params = params
            .iter()
            .enumerate()
            .map(|(position, id)| match self.get(*id) {
                Type::Slice(elem) if variadic && position == last => {
                    format!("...{}", self.key(*elem))
                }
                _ => self.key(*id).to_string(),
            })
            .join(", ");
        match results {
            [] => format!("({params})"),
            [single] => format!("({params}) {}", self.key(*single)),
            many => format!(
                "({params}) ({})",
                many.iter().map(|id| self.key(*id)).join(", ")
            ),
        }
    }

    /// Follows alias chains to the aliased type.
    pub fn unalias(&self, mut id: TypeId) -> TypeId {
        for _ in 0..self.entries.len() {
            match self.get(id) {
                Type::Alias {
                    target: Some(target),
                    ..
                } => id = *target,
                _ => break,
            }
        }
        id
    }

    pub fn underlying(&self, id: TypeId) -> TypeId {
        let mut id = self.unalias(id);
        for _ in 0..self.entries.len() {
            match self.get(id) {
                Type::Named {
                    underlying: Some(underlying),
                    ..
                } => id = self.unalias(*underlying),
                _ => break,
            }
        }
        id
    }

    /// Named and predeclared types; unnamed types are type literals.
    pub fn is_defined(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.unalias(id)),
            Type::Named { .. } | Type::Basic(_) | Type::TypeParam(_)
        )
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.underlying(id)),
            Type::Interface { .. } | Type::TypeParam(_)
        )
    }

    pub fn is_type_param(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::TypeParam(_))
    }

    pub fn identical(&self, a: TypeId, b: TypeId) -> bool {
        self.unalias(a) == self.unalias(b)
    }

    /// Methods callable on a value of type `id`: value-receiver methods for
    /// `N`, all methods for `*N`, the full flattened set for interfaces.
    pub fn method_set(&self, id: TypeId) -> Vec<MethodSig> {
        let id = self.unalias(id);
        if self.is_interface(id) {
            return self.interface_methods(self.underlying(id));
        }
        match self.get(id) {
            Type::Pointer(elem) => match self.get(self.unalias(*elem)) {
                Type::Named { methods, .. } if !self.is_interface(*elem) => {
                    methods.iter().map(Self::as_sig).collect()
                }
                _ => vec![],
            },
            Type::Named { methods, .. } => methods
                .iter()
                .filter(|method| !method.pointer_receiver)
                .map(Self::as_sig)
                .collect(),
            _ => vec![],
        }
    }

    fn as_sig(method: &Method) -> MethodSig {
        MethodSig {
            name: method.name.clone(),
            signature: method.signature,
        }
    }

    fn interface_methods(&self, id: TypeId) -> Vec<MethodSig> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_interface_methods(id, &mut seen, &mut out);
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out.dedup_by(|a, b| a.name == b.name);
        out
    }

    fn collect_interface_methods(
        &self,
        id: TypeId,
        seen: &mut HashSet<TypeId>,
        out: &mut Vec<MethodSig>,
    ) {
        let id = self.underlying(id);
        if !seen.insert(id) {
            return;
        }
        if let Type::Interface { methods, embedded } = self.get(id) {
            out.extend(methods.iter().cloned());
            for inner in embedded {
                self.collect_interface_methods(*inner, seen, out);
            }
        }
    }

    pub fn implements(&self, ty: TypeId, iface: TypeId) -> bool {
        if !self.is_interface(iface) || self.is_type_param(iface) {
            return false;
        }
        let have = self.method_set(ty);
        self.method_set(iface).iter().all(|wanted| {
            have.iter().any(|method| {
                method.name == wanted.name && self.identical(method.signature, wanted.signature)
            })
        })
    }

    /// Go assignability of a value of type `value` to a variable of type `target`.
    pub fn assignable_to(&self, value: TypeId, target: TypeId) -> bool {
        if self.identical(value, target) {
            return true;
        }
        let value_under = self.underlying(value);
        let target_under = self.underlying(target);
        if value_under == target_under
            && (!self.is_defined(value) || !self.is_defined(target))
            && !self.is_type_param(value)
            && !self.is_type_param(target)
        {
            return true;
        }
        if let Type::Basic(kind) = self.get(value_under) {
            if kind.is_untyped() {
                return self.untyped_fits(*kind, target_under);
            }
        }
        if self.is_interface(target) && !self.is_type_param(target) {
            return self.implements(value, target);
        }
        if let (
            Type::Chan {
                dir: ChanDir::Both,
                elem: value_elem,
            },
            Type::Chan {
                elem: target_elem, ..
            },
        ) = (self.get(value_under), self.get(target_under))
        {
            return self.identical(*value_elem, *target_elem)
                && (!self.is_defined(value) || !self.is_defined(target));
        }
        false
    }

    fn untyped_fits(&self, kind: BasicKind, target_under: TypeId) -> bool {
        let target = self.get(target_under);
        if kind == BasicKind::UntypedNil {
            return matches!(
                target,
                Type::Pointer(_)
                    | Type::Signature { .. }
                    | Type::Slice(_)
                    | Type::Map { .. }
                    | Type::Chan { .. }
                    | Type::Interface { .. }
                    | Type::Basic(BasicKind::UnsafePointer)
            );
        }
        match target {
            Type::Interface { .. } => self.method_set(target_under).is_empty(),
            Type::Basic(target) => match kind {
                BasicKind::UntypedBool => target.is_boolean(),
                BasicKind::UntypedInt | BasicKind::UntypedRune => {
                    target.is_integer() || target.is_float()
                }
                BasicKind::UntypedFloat => target.is_float(),
                BasicKind::UntypedString => target.is_string(),
                _ => false,
            },
            _ => false,
        }
    }

    /// Resolves `name` on the receiver type `recv` (through one pointer).
    pub fn lookup_method(&self, recv: TypeId, name: &str) -> Option<&Method> {
        let mut id = self.unalias(recv);
        if let Type::Pointer(elem) = self.get(id) {
            id = self.unalias(*elem);
        }
        match self.get(id) {
            Type::Named { methods, .. } => methods.iter().find(|method| method.name == name),
            _ => None,
        }
    }
}
