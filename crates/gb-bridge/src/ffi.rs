//! C surface over one process-wide session.
//!
//! Handles cross as `i64`. List queries follow one shape: the caller passes
//! a buffer of `size` slots, the callee fills at most `size` of them and
//! returns how many it wrote. A null buffer returns the full count.

use std::ffi::{c_char, CStr};
use std::sync::{Mutex, MutexGuard, PoisonError};

use gb_wire::Handle;
use tracing::{error, warn};

use crate::bridge::Bridge;

/// `gobridge_step` result for a request that failed without ending the
/// process.
pub const STEP_FAILED: i64 = -1;

static SESSION: Mutex<Option<Bridge>> = Mutex::new(None);

fn session() -> MutexGuard<'static, Option<Bridge>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_session<T>(fallback: T, f: impl FnOnce(&mut Bridge) -> T) -> T {
    match session().as_mut() {
        Some(bridge) => f(bridge),
        None => {
            warn!("bridge used before initialize");
            fallback
        }
    }
}

unsafe fn write_handles(handles: &[Handle], out: *mut i64, size: i32) -> i32 {
    if out.is_null() {
        return handles.len() as i32;
    }
    let count = handles.len().min(size.max(0) as usize);
    for (offset, handle) in handles.iter().take(count).enumerate() {
        *out.add(offset) = handle.to_wire();
    }
    count as i32
}

/// Loads a program document and replaces the current session.
/// Returns 0 on success, 1 on failure.
///
/// # Safety
/// `source` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn gobridge_initialize(source: *const u8, len: usize, debug: bool) -> i32 {
    if source.is_null() {
        error!("initialize called with a null document");
        return 1;
    }
    let bytes = std::slice::from_raw_parts(source, len);
    match Bridge::initialize(bytes, debug) {
        Ok(bridge) => {
            *session() = Some(bridge);
            0
        }
        Err(err) => {
            error!("initialize failed: {err:?}");
            1
        }
    }
}

#[no_mangle]
pub extern "C" fn gobridge_shutdown() {
    session().take();
}

/// # Safety
/// `name` must be a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn gobridge_lookup_function(name: *const c_char) -> i64 {
    if name.is_null() {
        return Handle::NONE.to_wire();
    }
    let Ok(name) = CStr::from_ptr(name).to_str() else {
        warn!("function name is not valid UTF-8");
        return Handle::NONE.to_wire();
    };
    with_session(Handle::NONE, |bridge| bridge.lookup_function(name)).to_wire()
}

/// Encodes one instruction into `out` and returns the next handle, 0 when
/// the engine decides, or [`STEP_FAILED`]. Aborts on an instruction the
/// encoder cannot represent.
///
/// # Safety
/// `out` must point to `capacity` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn gobridge_step(
    handle: i64,
    last_block: i32,
    out: *mut u8,
    capacity: usize,
) -> i64 {
    let mut guard = session();
    let Some(bridge) = guard.as_mut() else {
        warn!("bridge used before initialize");
        return STEP_FAILED;
    };
    match bridge.step(Handle::from_wire(handle), last_block) {
        Ok(next) => {
            let record = bridge.output();
            if out.is_null() || record.len() > capacity {
                error!(
                    needed = record.len(),
                    capacity, "output buffer too small for record"
                );
                return STEP_FAILED;
            }
            std::ptr::copy_nonoverlapping(record.as_ptr(), out, record.len());
            next.to_wire()
        }
        Err(err) if err.is_fatal() => {
            error!("{err}");
            std::process::abort();
        }
        Err(err) => {
            error!("step failed: {err}");
            STEP_FAILED
        }
    }
}

/// Length of the record written by the last successful step.
#[no_mangle]
pub extern "C" fn gobridge_output_len() -> i32 {
    with_session(0, |bridge| bridge.output().len() as i32)
}

macro_rules! handle_list_query {
    ($($export:ident => $method:ident),+ $(,)?) => {
        $(
            /// # Safety
            /// `out` must be null or point to `size` writable `i64` slots.
            #[no_mangle]
            pub unsafe extern "C" fn $export(handle: i64, out: *mut i64, size: i32) -> i32 {
                let handles = with_session(Vec::new(), |bridge| {
                    bridge.$method(Handle::from_wire(handle))
                });
                write_handles(&handles, out, size)
            }
        )+
    };
}

handle_list_query! {
    gobridge_predecessors => predecessors,
    gobridge_successors => successors,
    gobridge_callees => callees,
    gobridge_callers => callers,
    gobridge_entry_points => entry_points,
    gobridge_exit_points => exit_points,
    gobridge_statements_of => statements_of,
    gobridge_find_subtypes => find_subtypes,
    gobridge_struct_field_types => struct_field_types,
    gobridge_tuple_types => tuple_types,
}

#[no_mangle]
pub extern "C" fn gobridge_method_of(instruction: i64) -> i64 {
    with_session(Handle::NONE, |bridge| {
        bridge.method_of(Handle::from_wire(instruction))
    })
    .to_wire()
}

#[no_mangle]
pub extern "C" fn gobridge_method_implementation(method: i64, receiver_type: i64) -> i64 {
    with_session(Handle::NONE, |bridge| {
        bridge.method_implementation(Handle::from_wire(method), Handle::from_wire(receiver_type))
    })
    .to_wire()
}

/// Writes parameter and local counts; returns 0 on success, 1 for an
/// unknown function.
///
/// # Safety
/// Both pointers must be writable.
#[no_mangle]
pub unsafe extern "C" fn gobridge_method_info(
    function: i64,
    parameters: *mut i32,
    locals: *mut i32,
) -> i32 {
    let info = with_session(None, |bridge| bridge.method_info(Handle::from_wire(function)));
    match info {
        Some(info) if !parameters.is_null() && !locals.is_null() => {
            *parameters = info.parameters as i32;
            *locals = info.locals as i32;
            0
        }
        _ => 1,
    }
}

#[no_mangle]
pub extern "C" fn gobridge_any_type() -> i64 {
    with_session(Handle::NONE, Bridge::any_type).to_wire()
}

#[no_mangle]
pub extern "C" fn gobridge_is_instantiable(ty: i64) -> bool {
    with_session(false, |bridge| bridge.is_instantiable(Handle::from_wire(ty)))
}

#[no_mangle]
pub extern "C" fn gobridge_is_final(ty: i64) -> bool {
    with_session(false, |bridge| bridge.is_final(Handle::from_wire(ty)))
}

/// # Safety
/// `others` must be null or point to `count` readable `i64`s.
#[no_mangle]
pub unsafe extern "C" fn gobridge_has_common_subtype(
    ty: i64,
    others: *const i64,
    count: i32,
) -> bool {
    let others: Vec<Handle> = if others.is_null() || count <= 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(others, count as usize)
            .iter()
            .copied()
            .map(Handle::from_wire)
            .collect()
    };
    with_session(false, |bridge| {
        bridge.has_common_subtype(Handle::from_wire(ty), &others)
    })
}

#[no_mangle]
pub extern "C" fn gobridge_is_supertype(supertype: i64, ty: i64) -> bool {
    with_session(false, |bridge| {
        bridge.is_supertype(Handle::from_wire(supertype), Handle::from_wire(ty))
    })
}

#[no_mangle]
pub extern "C" fn gobridge_type_to_sort(ty: i64, unwrap_pointer: bool) -> u8 {
    with_session(0, |bridge| {
        bridge.type_to_sort(Handle::from_wire(ty), unwrap_pointer).tag()
    })
}

#[no_mangle]
pub extern "C" fn gobridge_array_element_type(ty: i64) -> i64 {
    with_session(Handle::NONE, |bridge| {
        bridge.array_element_type(Handle::from_wire(ty))
    })
    .to_wire()
}

/// Fills `out[0]` with the key type and `out[1]` with the value type.
/// Returns 2, or 0 for a non-map.
///
/// # Safety
/// `out` must be null or point to `size` writable `i64` slots.
#[no_mangle]
pub unsafe extern "C" fn gobridge_map_key_value_types(ty: i64, out: *mut i64, size: i32) -> i32 {
    let pair = with_session(None, |bridge| bridge.map_key_value_types(Handle::from_wire(ty)));
    match pair {
        Some((key, value)) => write_handles(&[key, value], out, size),
        None => 0,
    }
}

#[no_mangle]
pub extern "C" fn gobridge_type_hash(ty: i64) -> i64 {
    with_session(0, |bridge| bridge.type_hash(Handle::from_wire(ty)))
}
