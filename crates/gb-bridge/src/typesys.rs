//! Type queries. Every argument and result is a type handle.

use gb_ssa::{BasicKind, Type, TypeId};
use gb_wire::{Handle, Sort};

use crate::bridge::Bridge;
use crate::registry::type_hash;
use crate::sort::{element_type, map_types, sort_of};

impl Bridge {
    fn type_of(&self, handle: Handle) -> Option<TypeId> {
        self.registry.resolve_type(handle)
    }

    fn type_handles(&mut self, types: Vec<TypeId>) -> Vec<Handle> {
        types.into_iter().map(|ty| self.registry.ty(ty)).collect()
    }

    /// Handle of a type by canonical spelling, [`Handle::NONE`] if the
    /// program never mentions it.
    pub fn lookup_type(&mut self, key: &str) -> Handle {
        match self.program.types().lookup(key) {
            Some(ty) => self.registry.ty(ty),
            None => Handle::NONE,
        }
    }

    /// The empty interface.
    pub fn any_type(&mut self) -> Handle {
        let any = self.program.types().any();
        self.registry.ty(any)
    }

    /// Every known type implementing the interface `handle`. Empty for
    /// non-interfaces.
    pub fn find_subtypes(&mut self, handle: Handle) -> Vec<Handle> {
        let Some(iface) = self.type_of(handle) else {
            return vec![];
        };
        let types = self.program.types();
        if !types.is_interface(iface) || types.is_type_param(iface) {
            return vec![];
        }
        let subtypes: Vec<TypeId> = types
            .iter()
            .filter(|(id, ty)| match ty {
                Type::Basic(kind) => !kind.is_untyped() && *kind != BasicKind::Invalid,
                Type::Tuple(_) | Type::TypeParam(_) | Type::Alias { .. } => false,
                Type::Named { underlying, .. } => underlying.is_some() && *id != iface,
                _ => !types.identical(*id, iface),
            })
            .map(|(id, _)| id)
            .filter(|id| types.implements(*id, iface))
            .collect();
        self.type_handles(subtypes)
    }

    pub fn is_instantiable(&self, handle: Handle) -> bool {
        self.type_of(handle)
            .is_some_and(|ty| !self.program.types().is_interface(ty))
    }

    pub fn is_final(&self, handle: Handle) -> bool {
        self.is_instantiable(handle)
    }

    /// True when `others` is empty; otherwise when `handle` and every
    /// element of `others` are interfaces.
    pub fn has_common_subtype(&self, handle: Handle, others: &[Handle]) -> bool {
        if others.is_empty() {
            return true;
        }
        let types = self.program.types();
        std::iter::once(&handle).chain(others).all(|other| {
            self.type_of(*other)
                .is_some_and(|ty| types.is_interface(ty))
        })
    }

    /// Whether `handle` is identical or assignable to `supertype`.
    pub fn is_supertype(&self, supertype: Handle, handle: Handle) -> bool {
        let (Some(supertype), Some(ty)) = (self.type_of(supertype), self.type_of(handle)) else {
            return false;
        };
        let types = self.program.types();
        types.identical(ty, supertype) || types.assignable_to(ty, supertype)
    }

    pub fn type_to_sort(&self, handle: Handle, unwrap_pointer: bool) -> Sort {
        self.type_of(handle).map_or(Sort::Unknown, |ty| {
            sort_of(self.program.types(), ty, unwrap_pointer)
        })
    }

    /// Element type of an array or slice type.
    pub fn array_element_type(&mut self, handle: Handle) -> Handle {
        let types = self.program.types();
        let elem = self.type_of(handle).and_then(|ty| {
            match types.get(types.underlying(ty)) {
                Type::Array { .. } | Type::Slice(_) => element_type(types, ty),
                _ => None,
            }
        });
        elem.map_or(Handle::NONE, |elem| self.registry.ty(elem))
    }

    pub fn map_key_value_types(&mut self, handle: Handle) -> Option<(Handle, Handle)> {
        let (key, value) = map_types(self.program.types(), self.type_of(handle)?)?;
        Some((self.registry.ty(key), self.registry.ty(value)))
    }

    pub fn struct_field_types(&mut self, handle: Handle) -> Vec<Handle> {
        let types = self.program.types();
        let fields: Vec<TypeId> = self
            .type_of(handle)
            .map(|ty| match types.get(types.underlying(ty)) {
                Type::Struct(fields) => fields.iter().map(|field| field.ty).collect(),
                _ => vec![],
            })
            .unwrap_or_default();
        self.type_handles(fields)
    }

    pub fn tuple_types(&mut self, handle: Handle) -> Vec<Handle> {
        let types = self.program.types();
        let elems: Vec<TypeId> = self
            .type_of(handle)
            .map(|ty| match types.get(types.underlying(ty)) {
                Type::Tuple(elems) => elems.clone(),
                _ => vec![],
            })
            .unwrap_or_default();
        self.type_handles(elems)
    }

    /// Zero for handles that do not name a type.
    pub fn type_hash(&self, handle: Handle) -> i64 {
        self.type_of(handle)
            .map_or(0, |ty| type_hash(self.program.types(), ty))
    }
}
