use gb_ssa::{BasicKind, Type, TypeId, TypeTable};
use gb_wire::Sort;

/// Reduces a Go type to the engine's sort. Total: anything without a
/// counterpart is [`Sort::Unknown`].
///
/// With `unwrap_pointer` pointers map to the sort of the type they finally
/// point at.
pub fn sort_of(types: &TypeTable, ty: TypeId, unwrap_pointer: bool) -> Sort {
    if !types.contains(ty) {
        return Sort::Unknown;
    }
    let ty = if unwrap_pointer { pointee(types, ty) } else { ty };
    match types.get(types.underlying(ty)) {
        Type::Basic(kind) => basic_sort(*kind),
        Type::Pointer(_) => Sort::Pointer,
        Type::Array { .. } => Sort::Array,
        Type::Slice(_) => Sort::Slice,
        Type::Map { .. } => Sort::Map,
        Type::Struct(_) => Sort::Struct,
        Type::Interface { .. } => Sort::Interface,
        Type::Tuple(elems) if elems.is_empty() => Sort::Void,
        Type::Tuple(_) => Sort::Tuple,
        Type::Chan { .. } | Type::Signature { .. } | Type::TypeParam(_) => Sort::Unknown,
        // unresolved names and aliases
        Type::Named { .. } | Type::Alias { .. } => Sort::Unknown,
    }
}

/// Follows pointers down to the first non-pointer. A pointer cycle such as
/// `type P *P` stops where it closes.
fn pointee(types: &TypeTable, mut ty: TypeId) -> TypeId {
    let mut seen = vec![];
    while let Type::Pointer(elem) = types.get(types.underlying(ty)) {
        if seen.contains(&ty) || !types.contains(*elem) {
            break;
        }
        seen.push(ty);
        ty = *elem;
    }
    ty
}

pub fn basic_sort(kind: BasicKind) -> Sort {
    match kind {
        BasicKind::Bool | BasicKind::UntypedBool => Sort::Bool,
        BasicKind::Int8 => Sort::Int8,
        BasicKind::Int16 => Sort::Int16,
        BasicKind::Int32 | BasicKind::UntypedRune => Sort::Int32,
        BasicKind::Int | BasicKind::UntypedInt => Sort::Int32,
        BasicKind::Int64 => Sort::Int64,
        BasicKind::Uint8 => Sort::Uint8,
        BasicKind::Uint16 => Sort::Uint16,
        BasicKind::Uint32 | BasicKind::Uint => Sort::Uint32,
        BasicKind::Uint64 | BasicKind::Uintptr => Sort::Uint64,
        BasicKind::Float32 => Sort::Float32,
        BasicKind::Float64 | BasicKind::UntypedFloat => Sort::Float64,
        BasicKind::String | BasicKind::UntypedString => Sort::String,
        BasicKind::UnsafePointer => Sort::Pointer,
        BasicKind::Complex64
        | BasicKind::Complex128
        | BasicKind::UntypedNil
        | BasicKind::Invalid => Sort::Unknown,
    }
}

/// Element type of an array, slice, pointer to array, map or string
/// (`uint8`).
pub fn element_type(types: &TypeTable, ty: TypeId) -> Option<TypeId> {
    match types.get(types.underlying(ty)) {
        Type::Array { elem, .. } | Type::Slice(elem) | Type::Map { elem, .. } => Some(*elem),
        Type::Pointer(inner) => match types.get(types.underlying(*inner)) {
            Type::Array { elem, .. } => Some(*elem),
            _ => None,
        },
        Type::Basic(kind) if kind.is_string() => Some(types.basic(BasicKind::Uint8)),
        _ => None,
    }
}

pub fn element_sort(types: &TypeTable, ty: TypeId) -> Sort {
    element_type(types, ty).map_or(Sort::Unknown, |elem| sort_of(types, elem, false))
}

/// Type of field `index` of a struct or of a pointer to one.
pub fn field_type(types: &TypeTable, ty: TypeId, index: u32) -> Option<TypeId> {
    let mut under = types.underlying(ty);
    if let Type::Pointer(inner) = types.get(under) {
        under = types.underlying(*inner);
    }
    match types.get(under) {
        Type::Struct(fields) => fields.get(index as usize).map(|field| field.ty),
        _ => None,
    }
}

pub fn map_types(types: &TypeTable, ty: TypeId) -> Option<(TypeId, TypeId)> {
    match types.get(types.underlying(ty)) {
        Type::Map { key, elem } => Some((*key, *elem)),
        _ => None,
    }
}
