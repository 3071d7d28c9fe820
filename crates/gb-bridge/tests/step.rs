mod common;

use common::{
    bridge, bridge_with, entry, operations_bridge, read_operand, statements, step_record, Payload,
};
use gb_bridge::{BridgeConfig, StepError};
use gb_wire::{
    BinaryOperator, Builtin, Handle, Opcode, Sort, UnaryOperator, ValueKind, WireError, WireReader,
};
use pretty_assertions::assert_eq;

#[test]
fn branch_suspends_and_each_side_returns_its_parameter() {
    let mut bridge = bridge();
    let compare = entry(&mut bridge, "main.f");

    let branch = bridge.step(compare, -1).expect("BinOp encodes");
    let record = bridge.output().to_vec();
    let mut reader = WireReader::new(&record);
    assert_eq!(reader.get_i32().unwrap(), 0);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::BinOp);
    let result = read_operand(&mut reader);
    assert_eq!(result.kind, ValueKind::Local);
    assert_eq!(result.sort, Sort::Bool);
    assert_eq!(result.payload, Payload::Local(compare));
    let x = read_operand(&mut reader);
    assert_eq!((x.kind, x.sort, x.payload), (ValueKind::Parameter, Sort::Int32, Payload::Index(0)));
    assert_eq!(reader.get_binary_operator().unwrap(), BinaryOperator::Lt);
    let y = read_operand(&mut reader);
    assert_eq!(y.payload, Payload::Index(1));
    assert!(reader.is_exhausted());

    assert_eq!(bridge.step(branch, 0).unwrap(), Handle::NONE);
    let record = bridge.output().to_vec();
    let mut reader = WireReader::new(&record);
    assert_eq!(reader.get_i32().unwrap(), 0);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::If);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(compare));
    let on_true = reader.get_handle().unwrap();
    let on_false = reader.get_handle().unwrap();
    assert!(!on_true.is_none() && !on_false.is_none());
    assert_ne!(on_true, on_false);

    for (target, block, index) in [(on_true, 1, 0), (on_false, 2, 1)] {
        assert_eq!(bridge.step(target, 0).unwrap(), Handle::NONE);
        let record = bridge.output().to_vec();
        let mut reader = WireReader::new(&record);
        assert_eq!(reader.get_i32().unwrap(), block);
        assert_eq!(reader.get_opcode().unwrap(), Opcode::Return);
        assert_eq!(reader.get_i32().unwrap(), 1);
        let value = read_operand(&mut reader);
        assert_eq!(value.kind, ValueKind::Parameter);
        assert_eq!(value.sort, Sort::Int32);
        assert_eq!(value.payload, Payload::Index(index));
        assert!(reader.is_exhausted());
    }
}

#[test]
fn static_call_names_function_and_entry() {
    let mut bridge = bridge();
    let call = entry(&mut bridge, "main.g");
    let callee = bridge.lookup_function("main.h");
    let callee_entry = bridge.entry_points(callee)[0];

    let next = bridge.step(call, 0).unwrap();
    let record = bridge.output().to_vec();
    let mut reader = WireReader::new(&record);
    reader.get_i32().unwrap();
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Call);
    assert_eq!(read_operand(&mut reader).sort, Sort::Int32);
    assert_eq!(reader.get_i32().unwrap(), 1);
    assert_eq!(read_operand(&mut reader).payload, Payload::Index(0));
    assert!(!reader.get_bool().unwrap());
    assert_eq!(reader.get_handle().unwrap(), callee);
    assert_eq!(reader.get_handle().unwrap(), callee_entry);
    assert!(reader.is_exhausted());

    assert_eq!(next, statements(&mut bridge, "main.g")[1]);
}

#[test]
fn len_is_a_builtin_without_trailing_sort() {
    let mut bridge = bridge();
    let call = entry(&mut bridge, "main.size");
    bridge.step(call, 0).unwrap();
    let record = bridge.output().to_vec();
    let mut reader = WireReader::new(&record);
    reader.get_i32().unwrap();
    assert_eq!(reader.get_opcode().unwrap(), Opcode::CallBuiltin);
    read_operand(&mut reader);
    assert_eq!(reader.get_builtin().unwrap(), Builtin::Len);
    assert_eq!(reader.get_i32().unwrap(), 1);
    let arg = read_operand(&mut reader);
    assert_eq!(arg.sort, Sort::Slice);
    assert!(reader.is_exhausted());
}

#[test]
fn phi_takes_the_edge_of_the_block_it_came_from() {
    let mut bridge = bridge();
    let stmts = statements(&mut bridge, "main.pick");
    let (left_jump, phi) = (stmts[1], stmts[3]);

    assert_eq!(bridge.step(left_jump, 0).unwrap(), phi);
    let mut reader = WireReader::new(bridge.output());
    assert_eq!(reader.get_i32().unwrap(), 1);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Jump);
    assert!(reader.is_exhausted());

    for (last_block, expected) in [(1, 1), (2, 2)] {
        bridge.step(phi, last_block).unwrap();
        let record = bridge.output().to_vec();
        let mut reader = WireReader::new(&record);
        assert_eq!(reader.get_i32().unwrap(), last_block);
        assert_eq!(reader.get_opcode().unwrap(), Opcode::Variable);
        read_operand(&mut reader);
        let edge = read_operand(&mut reader);
        assert_eq!(edge.kind, ValueKind::Const);
        assert_eq!(edge.payload, Payload::Int(expected));
    }

    let err = bridge.step(phi, 0).unwrap_err();
    assert!(matches!(err, StepError::PhiEdgeMissing { last_block: 0, .. }));
    assert!(!err.is_fatal());
    assert!(bridge.output().is_empty());
}

#[test]
fn panic_carries_the_boxed_value() {
    let mut bridge = bridge();
    let panic = statements(&mut bridge, "main.fail")[1];
    assert_eq!(bridge.step(panic, 0).unwrap(), Handle::NONE);
    let record = bridge.output().to_vec();
    let mut reader = WireReader::new(&record);
    reader.get_i32().unwrap();
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Panic);
    let cause = read_operand(&mut reader);
    assert_eq!(cause.sort, Sort::String);
    assert_eq!(cause.payload, Payload::Str("boom".to_string()));
}

#[test]
fn interface_call_is_dynamic() {
    let mut bridge = bridge();
    let call = entry(&mut bridge, "main.measure");
    bridge.step(call, 0).unwrap();
    let record = bridge.output().to_vec();
    let mut reader = WireReader::new(&record);
    reader.get_i32().unwrap();
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Call);
    assert_eq!(read_operand(&mut reader).sort, Sort::Float64);
    assert_eq!(reader.get_i32().unwrap(), 1);
    let receiver = read_operand(&mut reader);
    assert_eq!(receiver.sort, Sort::Interface);
    assert_eq!(receiver.payload, Payload::Index(0));
    assert!(reader.get_bool().unwrap());
    let method = reader.get_handle().unwrap();
    assert!(reader.is_exhausted());

    let square = bridge.lookup_type("main.Square");
    let area = bridge.lookup_function("main.Square.Area");
    assert_eq!(bridge.method_implementation(method, square), area);
    assert_eq!(bridge.method_implementation(method, Handle::NONE), Handle::NONE);
}

#[test]
fn unknown_opcode_is_fatal_and_leaves_nothing_behind() {
    let mut bridge = bridge();
    let rotate = entry(&mut bridge, "main.weird");
    let err = bridge.step(rotate, 0).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, StepError::UnknownOpcode { ref op, .. } if op == "Rotate"));
    assert!(bridge.output().is_empty());
}

#[test]
fn handles_are_stable_and_checked() {
    let mut bridge = bridge();
    let first = entry(&mut bridge, "main.f");
    let again = entry(&mut bridge, "main.f");
    assert_eq!(first, again);
    assert_eq!(bridge.lookup_function("main.f"), bridge.lookup_function("main.f"));
    assert_eq!(bridge.lookup_function("main.missing"), Handle::NONE);

    let next = bridge.step(first, -1).unwrap();
    let record = bridge.output().to_vec();
    assert_eq!(bridge.step(first, -1).unwrap(), next);
    assert_eq!(bridge.output(), record.as_slice());

    assert_eq!(
        bridge.step(Handle::new(9_999), 0).unwrap_err(),
        StepError::UnknownHandle(Handle::new(9_999))
    );
    let function = bridge.lookup_function("main.f");
    assert_eq!(
        bridge.step(function, 0).unwrap_err(),
        StepError::NotAnInstruction(function)
    );
}

#[test]
fn oversized_records_fail_without_partial_output() {
    let mut bridge = bridge_with(BridgeConfig::default().with_buffer_capacity(64));
    let compare = entry(&mut bridge, "main.f");
    let err = bridge.step(compare, 0).unwrap_err();
    assert!(matches!(err, StepError::Wire(WireError::Overflow { .. })));
    assert!(!err.is_fatal());
    assert!(bridge.output().is_empty());
}

#[test]
fn alloc_names_the_pointee_and_array_shape() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.alloc");
    let array = bridge.lookup_type("[4]int");
    let int = bridge.lookup_type("int");
    let point = bridge.lookup_type("main.Point");

    let (next, header, body) = step_record(&mut bridge, stmts[0], -1);
    assert_eq!((next, header), (stmts[1], 0));
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Alloc);
    let result = read_operand(&mut reader);
    assert_eq!(
        (result.kind, result.sort, result.payload),
        (ValueKind::Local, Sort::Pointer, Payload::Local(stmts[0]))
    );
    assert_eq!(reader.get_sort().unwrap(), Sort::Array);
    assert_eq!(reader.get_handle().unwrap(), array);
    assert_eq!(reader.get_i64().unwrap(), 4);
    assert_eq!(reader.get_handle().unwrap(), int);
    assert!(reader.is_exhausted());

    let (_, _, body) = step_record(&mut bridge, stmts[1], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Alloc);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[1]));
    assert_eq!(reader.get_sort().unwrap(), Sort::Struct);
    assert_eq!(reader.get_handle().unwrap(), point);
    assert!(reader.is_exhausted());
}

#[test]
fn empty_return_writes_a_void_nil_marker() {
    let mut bridge = operations_bridge();
    let ret = statements(&mut bridge, "main.alloc")[2];
    let (next, header, body) = step_record(&mut bridge, ret, 0);
    assert_eq!((next, header), (Handle::NONE, 0));
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Return);
    assert_eq!(reader.get_i32().unwrap(), 0);
    let marker = read_operand(&mut reader);
    assert_eq!(
        (marker.kind, marker.sort, marker.payload),
        (ValueKind::Const, Sort::Void, Payload::Nil)
    );
    assert!(reader.is_exhausted());
}

#[test]
fn make_slice_and_default_slice_bounds() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.slices");
    let slice = bridge.lookup_type("[]int");

    let (_, _, body) = step_record(&mut bridge, stmts[0], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::MakeSlice);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[0]));
    assert_eq!(reader.get_handle().unwrap(), slice);
    let len = read_operand(&mut reader);
    assert_eq!((len.kind, len.payload), (ValueKind::Parameter, Payload::Index(0)));
    let cap = read_operand(&mut reader);
    assert_eq!((cap.kind, cap.sort, cap.payload), (ValueKind::Const, Sort::Int32, Payload::Int(8)));
    assert!(reader.is_exhausted());

    for (stmt, elem, base, bounds) in [
        (stmts[1], Sort::Int32, Payload::Local(stmts[0]), [1, -1, -1]),
        (stmts[2], Sort::Uint8, Payload::Index(2), [0, -1, -1]),
    ] {
        let (_, _, body) = step_record(&mut bridge, stmt, 0);
        let mut reader = WireReader::new(&body);
        assert_eq!(reader.get_opcode().unwrap(), Opcode::Slice);
        assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmt));
        assert_eq!(reader.get_sort().unwrap(), elem);
        assert_eq!(read_operand(&mut reader).payload, base);
        for expected in bounds {
            let bound = read_operand(&mut reader);
            assert_eq!(bound.kind, ValueKind::Const);
            assert_eq!(bound.sort, Sort::Int32);
            assert_eq!(bound.payload, Payload::Int(expected));
        }
        assert!(reader.is_exhausted());
    }
}

#[test]
fn index_store_and_array_pointer_records() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.slices");
    let pair = bridge.lookup_type("[2]int");

    let (_, _, body) = step_record(&mut bridge, stmts[3], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::IndexAddr);
    assert_eq!(read_operand(&mut reader).sort, Sort::Pointer);
    assert_eq!(reader.get_sort().unwrap(), Sort::Int32);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[1]));
    assert_eq!(read_operand(&mut reader).payload, Payload::Index(0));
    assert!(reader.is_exhausted());

    let (_, _, body) = step_record(&mut bridge, stmts[4], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Index);
    assert_eq!(read_operand(&mut reader).sort, Sort::Uint8);
    assert_eq!(reader.get_sort().unwrap(), Sort::Uint8);
    let base = read_operand(&mut reader);
    assert_eq!((base.sort, base.payload), (Sort::String, Payload::Index(2)));
    assert_eq!(read_operand(&mut reader).payload, Payload::Int(0));
    assert!(reader.is_exhausted());

    let (next, _, body) = step_record(&mut bridge, stmts[5], 0);
    assert_eq!(next, stmts[6]);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Store);
    let addr = read_operand(&mut reader);
    assert_eq!((addr.sort, addr.payload), (Sort::Pointer, Payload::Local(stmts[3])));
    assert_eq!(read_operand(&mut reader).payload, Payload::Int(5));
    assert!(reader.is_exhausted());

    let (_, _, body) = step_record(&mut bridge, stmts[6], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::SliceToArrayPointer);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[6]));
    assert_eq!(reader.get_handle().unwrap(), pair);
    assert_eq!(reader.get_sort().unwrap(), Sort::Int32);
    assert_eq!(reader.get_i64().unwrap(), 2);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[1]));
    assert!(reader.is_exhausted());
}

#[test]
fn append_and_copy_carry_the_element_sort() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.slices");
    for (stmt, builtin, first, second) in [
        (stmts[7], Builtin::Append, Payload::Index(1), Payload::Local(stmts[0])),
        (stmts[8], Builtin::Copy, Payload::Local(stmts[7]), Payload::Index(1)),
    ] {
        let (_, _, body) = step_record(&mut bridge, stmt, 0);
        let mut reader = WireReader::new(&body);
        assert_eq!(reader.get_opcode().unwrap(), Opcode::CallBuiltin);
        assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmt));
        assert_eq!(reader.get_builtin().unwrap(), builtin);
        assert_eq!(reader.get_i32().unwrap(), 2);
        let arg = read_operand(&mut reader);
        assert_eq!((arg.sort, arg.payload), (Sort::Slice, first));
        assert_eq!(read_operand(&mut reader).payload, second);
        assert_eq!(reader.get_sort().unwrap(), Sort::Int32);
        assert!(reader.is_exhausted());
    }
}

#[test]
fn map_records() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.maps");
    let map = bridge.lookup_type("map[string]int");

    for (stmt, reserve) in [(stmts[0], 0), (stmts[1], 16)] {
        let (_, _, body) = step_record(&mut bridge, stmt, 0);
        let mut reader = WireReader::new(&body);
        assert_eq!(reader.get_opcode().unwrap(), Opcode::MakeMap);
        let result = read_operand(&mut reader);
        assert_eq!((result.sort, result.payload), (Sort::Map, Payload::Local(stmt)));
        assert_eq!(reader.get_handle().unwrap(), map);
        let size = read_operand(&mut reader);
        assert_eq!(
            (size.kind, size.sort, size.payload),
            (ValueKind::Const, Sort::Int32, Payload::Int(reserve))
        );
        assert!(reader.is_exhausted());
    }

    let (_, _, body) = step_record(&mut bridge, stmts[2], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::MapUpdate);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[0]));
    let key = read_operand(&mut reader);
    assert_eq!((key.sort, key.payload), (Sort::String, Payload::Index(1)));
    assert_eq!(read_operand(&mut reader).payload, Payload::Int(1));
    assert!(reader.is_exhausted());

    for (stmt, result_sort, comma_ok) in [
        (stmts[3], Sort::Int32, false),
        (stmts[4], Sort::Tuple, true),
    ] {
        let (_, _, body) = step_record(&mut bridge, stmt, 0);
        let mut reader = WireReader::new(&body);
        assert_eq!(reader.get_opcode().unwrap(), Opcode::Lookup);
        assert_eq!(read_operand(&mut reader).sort, result_sort);
        assert_eq!(reader.get_sort().unwrap(), Sort::Int32);
        let base = read_operand(&mut reader);
        assert_eq!((base.sort, base.payload), (Sort::Map, Payload::Index(0)));
        assert_eq!(read_operand(&mut reader).payload, Payload::Index(1));
        assert_eq!(reader.get_bool().unwrap(), comma_ok);
        assert!(reader.is_exhausted());
    }

    let (_, _, body) = step_record(&mut bridge, stmts[5], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Extract);
    assert_eq!(read_operand(&mut reader).sort, Sort::Bool);
    let tuple = read_operand(&mut reader);
    assert_eq!((tuple.sort, tuple.payload), (Sort::Tuple, Payload::Local(stmts[4])));
    assert_eq!(reader.get_i32().unwrap(), 1);
    assert!(reader.is_exhausted());
}

#[test]
fn field_and_type_assert_records() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.fields");
    let point = bridge.lookup_type("main.Point");

    for (stmt, opcode, result_sort, field_sort, base, field) in [
        (stmts[0], Opcode::Field, Sort::String, Sort::String, Sort::Struct, 1),
        (stmts[1], Opcode::FieldAddr, Sort::Pointer, Sort::Int32, Sort::Pointer, 0),
    ] {
        let (_, _, body) = step_record(&mut bridge, stmt, 0);
        let mut reader = WireReader::new(&body);
        assert_eq!(reader.get_opcode().unwrap(), opcode);
        assert_eq!(read_operand(&mut reader).sort, result_sort);
        assert_eq!(reader.get_sort().unwrap(), field_sort);
        assert_eq!(read_operand(&mut reader).sort, base);
        assert_eq!(reader.get_i32().unwrap(), field);
        assert!(reader.is_exhausted());
    }

    for (stmt, result_sort, comma_ok) in [
        (stmts[2], Sort::Struct, false),
        (stmts[3], Sort::Tuple, true),
    ] {
        let (_, _, body) = step_record(&mut bridge, stmt, 0);
        let mut reader = WireReader::new(&body);
        assert_eq!(reader.get_opcode().unwrap(), Opcode::TypeAssert);
        assert_eq!(read_operand(&mut reader).sort, result_sort);
        let x = read_operand(&mut reader);
        assert_eq!((x.sort, x.payload), (Sort::Interface, Payload::Index(2)));
        assert_eq!(reader.get_handle().unwrap(), point);
        assert_eq!(reader.get_bool().unwrap(), comma_ok);
        assert!(reader.is_exhausted());
    }
}

#[test]
fn range_and_next_sorts_only_for_maps() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.iterate");

    let (_, _, body) = step_record(&mut bridge, stmts[0], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Range);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[0]));
    assert_eq!(read_operand(&mut reader).sort, Sort::String);
    assert!(reader.is_exhausted());

    let (_, _, body) = step_record(&mut bridge, stmts[1], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Next);
    assert_eq!(read_operand(&mut reader).sort, Sort::Tuple);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[0]));
    assert!(reader.get_bool().unwrap());
    assert!(reader.is_exhausted());

    let (_, _, body) = step_record(&mut bridge, stmts[2], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Range);
    read_operand(&mut reader);
    assert_eq!(read_operand(&mut reader).sort, Sort::Map);
    assert_eq!(reader.get_sort().unwrap(), Sort::String);
    assert_eq!(reader.get_sort().unwrap(), Sort::Int32);
    assert!(reader.is_exhausted());

    let (_, _, body) = step_record(&mut bridge, stmts[3], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Next);
    read_operand(&mut reader);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[2]));
    assert!(!reader.get_bool().unwrap());
    assert_eq!(reader.get_sort().unwrap(), Sort::String);
    assert_eq!(reader.get_sort().unwrap(), Sort::Int32);
    assert!(reader.is_exhausted());
}

#[test]
fn closure_bindings_become_free_variables() {
    let mut bridge = operations_bridge();
    let make = entry(&mut bridge, "main.adder");
    let body_fn = bridge.lookup_function("main.adder$1");

    let (_, _, body) = step_record(&mut bridge, make, 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::MakeClosure);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(make));
    assert_eq!(reader.get_handle().unwrap(), body_fn);
    assert_eq!(reader.get_i32().unwrap(), 1);
    let binding = read_operand(&mut reader);
    assert_eq!(
        (binding.kind, binding.sort, binding.payload),
        (ValueKind::Parameter, Sort::Int32, Payload::Index(0))
    );
    assert!(reader.is_exhausted());

    let add = entry(&mut bridge, "main.adder$1");
    let (_, _, body) = step_record(&mut bridge, add, 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::BinOp);
    read_operand(&mut reader);
    let captured = read_operand(&mut reader);
    assert_eq!(
        (captured.kind, captured.sort, captured.payload),
        (ValueKind::FreeVariable, Sort::Int32, Payload::Index(0))
    );
    assert_eq!(reader.get_binary_operator().unwrap(), BinaryOperator::Add);
    assert_eq!(read_operand(&mut reader).kind, ValueKind::Parameter);
    assert!(reader.is_exhausted());
}

#[test]
fn defers_and_recover_name_the_recovery_entry() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.guard");
    let guard = bridge.lookup_function("main.guard");
    let cleanup = bridge.lookup_function("main.cleanup");
    let cleanup_entry = bridge.entry_points(cleanup)[0];
    let recovery = stmts[5];

    let (next, _, body) = step_record(&mut bridge, stmts[0], 0);
    assert_eq!(next, stmts[1]);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Defer);
    assert_eq!(reader.get_i32().unwrap(), 0);
    assert!(!reader.get_bool().unwrap());
    assert_eq!(reader.get_handle().unwrap(), cleanup);
    assert_eq!(reader.get_handle().unwrap(), cleanup_entry);
    assert!(reader.is_exhausted());

    let (_, _, body) = step_record(&mut bridge, stmts[1], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Defer);
    assert_eq!(reader.get_i32().unwrap(), 0);
    assert!(!reader.get_bool().unwrap());
    assert_eq!(reader.get_handle().unwrap(), Handle::NONE);
    assert_eq!(reader.get_handle().unwrap(), Handle::NONE);
    assert_eq!(reader.get_builtin().unwrap(), Builtin::Recover);
    assert_eq!(reader.get_handle().unwrap(), guard);
    assert_eq!(reader.get_handle().unwrap(), recovery);
    assert!(reader.is_exhausted());
    assert!(bridge.callees(stmts[1]).is_empty());

    let (_, _, body) = step_record(&mut bridge, stmts[2], 0);
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::CallBuiltin);
    assert_eq!(read_operand(&mut reader).sort, Sort::Interface);
    assert_eq!(reader.get_builtin().unwrap(), Builtin::Recover);
    assert_eq!(reader.get_i32().unwrap(), 0);
    assert_eq!(reader.get_handle().unwrap(), guard);
    assert_eq!(reader.get_handle().unwrap(), recovery);
    assert!(reader.is_exhausted());

    let (next, _, body) = step_record(&mut bridge, stmts[3], 0);
    assert_eq!(next, stmts[4]);
    assert_eq!(body, vec![Opcode::RunDefers.tag()]);
}

#[test]
fn channel_and_goroutine_operations_are_noops() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.noops");
    for pair in stmts.windows(2) {
        let (next, header, body) = step_record(&mut bridge, pair[0], 0);
        assert_eq!(next, pair[1]);
        assert_eq!(header, 0);
        assert_eq!(body, vec![Opcode::Noop.tag()]);
    }
}

#[test]
fn end_of_block_falls_through_to_the_first_successor() {
    let mut bridge = operations_bridge();
    let stmts = statements(&mut bridge, "main.fall");

    let (next, _, _) = step_record(&mut bridge, stmts[0], -1);
    assert_eq!(next, stmts[1]);

    let (next, header, body) = step_record(&mut bridge, stmts[1], -1);
    assert_eq!((next, header), (stmts[2], 0));
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::UnOp);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[1]));
    assert_eq!(reader.get_unary_operator().unwrap(), UnaryOperator::Neg);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[0]));
    assert!(reader.is_exhausted());

    let (next, header, body) = step_record(&mut bridge, stmts[2], 0);
    assert_eq!((next, header), (Handle::NONE, 1));
    let mut reader = WireReader::new(&body);
    assert_eq!(reader.get_opcode().unwrap(), Opcode::Return);
    assert_eq!(reader.get_i32().unwrap(), 1);
    assert_eq!(read_operand(&mut reader).payload, Payload::Local(stmts[1]));
    assert!(reader.is_exhausted());
}
