#![allow(dead_code)]

use gb_bridge::{Bridge, BridgeConfig};
use gb_ssa::{JsonLoader, ProgramLoader};
use gb_wire::{Handle, Sort, ValueKind, WireReader};
use serde_json::json;

pub fn shapes_document() -> serde_json::Value {
    json!({
        "package": "main",
        "types": [
            {"name": "main.Shape", "underlying": "interface{Area() float64}"},
            {"name": "main.Square", "underlying": "struct{S float64}",
             "methods": [{"name": "Area", "signature": "func() float64", "function": "main.Square.Area"}]}
        ],
        "functions": [
            {
                "name": "main.f",
                "params": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
                "results": ["int"],
                "blocks": [
                    {"succs": [1, 2], "instrs": [
                        {"op": "BinOp", "register": "t0", "type": "bool", "operator": "<",
                         "x": {"kind": "Parameter", "index": 0},
                         "y": {"kind": "Parameter", "index": 1}},
                        {"op": "If", "cond": {"kind": "Register", "name": "t0"}}
                    ]},
                    {"instrs": [{"op": "Return", "results": [{"kind": "Parameter", "index": 0}]}]},
                    {"instrs": [{"op": "Return", "results": [{"kind": "Parameter", "index": 1}]}]}
                ]
            },
            {
                "name": "main.g",
                "params": [{"name": "x", "type": "int"}],
                "results": ["int"],
                "blocks": [{"instrs": [
                    {"op": "Call", "register": "t0", "type": "int",
                     "callee": {"kind": "Function", "name": "main.h"},
                     "args": [{"kind": "Parameter", "index": 0}]},
                    {"op": "Return", "results": [{"kind": "Register", "name": "t0"}]}
                ]}]
            },
            {
                "name": "main.h",
                "params": [{"name": "x", "type": "int"}],
                "results": ["int"],
                "blocks": [{"instrs": [
                    {"op": "Return", "results": [{"kind": "Parameter", "index": 0}]}
                ]}]
            },
            {
                "name": "main.size",
                "params": [{"name": "s", "type": "[]int"}],
                "results": ["int"],
                "blocks": [{"instrs": [
                    {"op": "Call", "register": "t0", "type": "int",
                     "callee": {"kind": "Builtin", "name": "len"},
                     "args": [{"kind": "Parameter", "index": 0}]},
                    {"op": "Return", "results": [{"kind": "Register", "name": "t0"}]}
                ]}]
            },
            {
                "name": "main.pick",
                "params": [{"name": "c", "type": "bool"}],
                "results": ["int"],
                "blocks": [
                    {"succs": [1, 2], "instrs": [{"op": "If", "cond": {"kind": "Parameter", "index": 0}}]},
                    {"succs": [3], "instrs": [{"op": "Jump"}]},
                    {"succs": [3], "instrs": [{"op": "Jump"}]},
                    {"instrs": [
                        {"op": "Phi", "register": "t0", "type": "int", "edges": [
                            {"kind": "Const", "type": "int", "value": 1},
                            {"kind": "Const", "type": "int", "value": 2}
                        ]},
                        {"op": "Return", "results": [{"kind": "Register", "name": "t0"}]}
                    ]}
                ]
            },
            {
                "name": "main.Square.Area",
                "params": [{"name": "s", "type": "main.Square"}],
                "results": ["float64"],
                "blocks": [{"instrs": [
                    {"op": "Return", "results": [{"kind": "Const", "type": "float64", "value": 1.5}]}
                ]}]
            },
            {
                "name": "main.measure",
                "params": [{"name": "s", "type": "main.Shape"}],
                "results": ["float64"],
                "blocks": [{"instrs": [
                    {"op": "Call", "register": "t0", "type": "float64",
                     "callee": {"kind": "Parameter", "index": 0}, "method": "Area", "args": []},
                    {"op": "Return", "results": [{"kind": "Register", "name": "t0"}]}
                ]}]
            },
            {
                "name": "main.fail",
                "blocks": [{"instrs": [
                    {"op": "MakeInterface", "register": "t0", "type": "interface{}",
                     "x": {"kind": "Const", "type": "string", "value": "boom"}},
                    {"op": "Panic", "x": {"kind": "Register", "name": "t0"}}
                ]}]
            },
            {
                "name": "main.keys",
                "params": [{"name": "m", "type": "map[string]int"}],
                "results": ["int", "bool"],
                "blocks": [{"instrs": [
                    {"op": "Return", "results": [
                        {"kind": "Const", "type": "int", "value": 0},
                        {"kind": "Const", "type": "bool", "value": true}
                    ]}
                ]}]
            },
            {
                "name": "main.weird",
                "blocks": [{"instrs": [
                    {"op": "Rotate"},
                    {"op": "Return"}
                ]}]
            }
        ]
    })
}

/// One function per family of record layouts.
pub fn operations_document() -> serde_json::Value {
    json!({
        "package": "main",
        "types": [
            {"name": "main.Point", "underlying": "struct{X int; Y string}"}
        ],
        "functions": [
            {
                "name": "main.alloc",
                "blocks": [{"instrs": [
                    {"op": "Alloc", "register": "t0", "type": "*[4]int", "heap": true},
                    {"op": "Alloc", "register": "t1", "type": "*main.Point"},
                    {"op": "Return"}
                ]}]
            },
            {
                "name": "main.slices",
                "params": [
                    {"name": "n", "type": "int"},
                    {"name": "s", "type": "[]int"},
                    {"name": "str", "type": "string"}
                ],
                "blocks": [{"instrs": [
                    {"op": "MakeSlice", "register": "t0", "type": "[]int",
                     "len": {"kind": "Parameter", "index": 0},
                     "cap": {"kind": "Const", "type": "int", "value": 8}},
                    {"op": "Slice", "register": "t1", "type": "[]int",
                     "x": {"kind": "Register", "name": "t0"},
                     "low": {"kind": "Const", "type": "int", "value": 1}},
                    {"op": "Slice", "register": "t2", "type": "string",
                     "x": {"kind": "Parameter", "index": 2}},
                    {"op": "IndexAddr", "register": "t3", "type": "*int",
                     "x": {"kind": "Register", "name": "t1"},
                     "index": {"kind": "Parameter", "index": 0}},
                    {"op": "Index", "register": "t4", "type": "uint8",
                     "x": {"kind": "Parameter", "index": 2},
                     "index": {"kind": "Const", "type": "int", "value": 0}},
                    {"op": "Store",
                     "addr": {"kind": "Register", "name": "t3"},
                     "value": {"kind": "Const", "type": "int", "value": 5}},
                    {"op": "SliceToArrayPointer", "register": "t5", "type": "*[2]int",
                     "x": {"kind": "Register", "name": "t1"}},
                    {"op": "Call", "register": "t6", "type": "[]int",
                     "callee": {"kind": "Builtin", "name": "append"},
                     "args": [{"kind": "Parameter", "index": 1}, {"kind": "Register", "name": "t0"}]},
                    {"op": "Call", "register": "t7", "type": "int",
                     "callee": {"kind": "Builtin", "name": "copy"},
                     "args": [{"kind": "Register", "name": "t6"}, {"kind": "Parameter", "index": 1}]},
                    {"op": "Return"}
                ]}]
            },
            {
                "name": "main.maps",
                "params": [
                    {"name": "m", "type": "map[string]int"},
                    {"name": "k", "type": "string"}
                ],
                "blocks": [{"instrs": [
                    {"op": "MakeMap", "register": "t0", "type": "map[string]int"},
                    {"op": "MakeMap", "register": "t1", "type": "map[string]int",
                     "reserve": {"kind": "Const", "type": "int", "value": 16}},
                    {"op": "MapUpdate",
                     "map": {"kind": "Register", "name": "t0"},
                     "key": {"kind": "Parameter", "index": 1},
                     "value": {"kind": "Const", "type": "int", "value": 1}},
                    {"op": "Lookup", "register": "t2", "type": "int",
                     "x": {"kind": "Parameter", "index": 0},
                     "key": {"kind": "Parameter", "index": 1}},
                    {"op": "Lookup", "register": "t3", "type": "(int, bool)",
                     "x": {"kind": "Parameter", "index": 0},
                     "key": {"kind": "Parameter", "index": 1},
                     "comma_ok": true},
                    {"op": "Extract", "register": "t4", "type": "bool",
                     "tuple": {"kind": "Register", "name": "t3"}, "index": 1},
                    {"op": "Return"}
                ]}]
            },
            {
                "name": "main.fields",
                "params": [
                    {"name": "p", "type": "main.Point"},
                    {"name": "pp", "type": "*main.Point"},
                    {"name": "v", "type": "interface{}"}
                ],
                "blocks": [{"instrs": [
                    {"op": "Field", "register": "t0", "type": "string",
                     "x": {"kind": "Parameter", "index": 0}, "field": 1},
                    {"op": "FieldAddr", "register": "t1", "type": "*int",
                     "x": {"kind": "Parameter", "index": 1}, "field": 0},
                    {"op": "TypeAssert", "register": "t2", "type": "main.Point",
                     "x": {"kind": "Parameter", "index": 2}, "asserted": "main.Point"},
                    {"op": "TypeAssert", "register": "t3", "type": "(main.Point, bool)",
                     "x": {"kind": "Parameter", "index": 2}, "asserted": "main.Point",
                     "comma_ok": true},
                    {"op": "Return"}
                ]}]
            },
            {
                "name": "main.iterate",
                "params": [
                    {"name": "s", "type": "string"},
                    {"name": "m", "type": "map[string]int"}
                ],
                "blocks": [{"instrs": [
                    {"op": "Range", "register": "t0", "type": "interface{}",
                     "x": {"kind": "Parameter", "index": 0}},
                    {"op": "Next", "register": "t1", "type": "(bool, int, int32)",
                     "iter": {"kind": "Register", "name": "t0"}, "is_string": true},
                    {"op": "Range", "register": "t2", "type": "interface{}",
                     "x": {"kind": "Parameter", "index": 1}},
                    {"op": "Next", "register": "t3", "type": "(bool, string, int)",
                     "iter": {"kind": "Register", "name": "t2"}},
                    {"op": "Return"}
                ]}]
            },
            {
                "name": "main.adder",
                "params": [{"name": "x", "type": "int"}],
                "results": ["func(int) int"],
                "blocks": [{"instrs": [
                    {"op": "MakeClosure", "register": "t0", "type": "func(int) int",
                     "func": "main.adder$1", "bindings": [{"kind": "Parameter", "index": 0}]},
                    {"op": "Return", "results": [{"kind": "Register", "name": "t0"}]}
                ]}]
            },
            {
                "name": "main.adder$1",
                "params": [{"name": "y", "type": "int"}],
                "free_vars": [{"name": "x", "type": "int"}],
                "results": ["int"],
                "blocks": [{"instrs": [
                    {"op": "BinOp", "register": "t0", "type": "int", "operator": "+",
                     "x": {"kind": "FreeVar", "index": 0},
                     "y": {"kind": "Parameter", "index": 0}},
                    {"op": "Return", "results": [{"kind": "Register", "name": "t0"}]}
                ]}]
            },
            {
                "name": "main.cleanup",
                "blocks": [{"instrs": [{"op": "Return"}]}]
            },
            {
                "name": "main.guard",
                "recover": 1,
                "blocks": [
                    {"instrs": [
                        {"op": "Defer", "callee": {"kind": "Function", "name": "main.cleanup"}},
                        {"op": "Defer", "callee": {"kind": "Builtin", "name": "recover"}},
                        {"op": "Call", "register": "t0", "type": "interface{}",
                         "callee": {"kind": "Builtin", "name": "recover"}},
                        {"op": "RunDefers"},
                        {"op": "Return"}
                    ]},
                    {"instrs": [{"op": "Return"}]}
                ]
            },
            {
                "name": "main.noops",
                "params": [{"name": "ch", "type": "chan int"}],
                "blocks": [{"instrs": [
                    {"op": "Send", "chan": {"kind": "Parameter", "index": 0},
                     "x": {"kind": "Const", "type": "int", "value": 1}},
                    {"op": "Go", "callee": {"kind": "Function", "name": "main.cleanup"}},
                    {"op": "MakeChan", "register": "t0", "type": "chan int",
                     "size": {"kind": "Const", "type": "int", "value": 0}},
                    {"op": "Select", "register": "t1", "type": "(int, bool)", "blocking": true},
                    {"op": "DebugRef", "x": {"kind": "Parameter", "index": 0}},
                    {"op": "Return"}
                ]}]
            },
            {
                "name": "main.fall",
                "params": [{"name": "a", "type": "int"}],
                "results": ["int"],
                "blocks": [
                    {"succs": [1], "instrs": [
                        {"op": "BinOp", "register": "t0", "type": "int", "operator": "+",
                         "x": {"kind": "Parameter", "index": 0},
                         "y": {"kind": "Const", "type": "int", "value": 1}},
                        {"op": "UnOp", "register": "t1", "type": "int", "operator": "-",
                         "x": {"kind": "Register", "name": "t0"}}
                    ]},
                    {"instrs": [{"op": "Return", "results": [{"kind": "Register", "name": "t1"}]}]}
                ]
            }
        ]
    })
}

fn load(document: serde_json::Value, config: BridgeConfig) -> Bridge {
    let bytes = serde_json::to_vec(&document).expect("fixture serializes");
    let program = JsonLoader.load(&bytes).expect("fixture should load");
    Bridge::from_program(program, config)
}

pub fn bridge_with(config: BridgeConfig) -> Bridge {
    load(shapes_document(), config)
}

pub fn bridge() -> Bridge {
    bridge_with(BridgeConfig::default())
}

pub fn operations_bridge() -> Bridge {
    load(operations_document(), BridgeConfig::default())
}

pub fn entry(bridge: &mut Bridge, function: &str) -> Handle {
    let function = bridge.lookup_function(function);
    assert!(!function.is_none(), "fixture function exists");
    bridge.entry_points(function)[0]
}

pub fn statements(bridge: &mut Bridge, function: &str) -> Vec<Handle> {
    let function = bridge.lookup_function(function);
    bridge.statements_of(function)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Index(i32),
    Local(Handle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub kind: ValueKind,
    pub ty: Handle,
    pub underlying: Handle,
    pub sort: Sort,
    pub payload: Payload,
}

/// Steps `handle`; returns the next handle, the last-block header and the
/// record bytes after it.
pub fn step_record(bridge: &mut Bridge, handle: Handle, last_block: i32) -> (Handle, i32, Vec<u8>) {
    let next = bridge.step(handle, last_block).expect("instruction encodes");
    let record = bridge.output().to_vec();
    let header = WireReader::new(&record).get_i32().unwrap();
    (next, header, record[4..].to_vec())
}

pub fn read_operand(reader: &mut WireReader<'_>) -> Operand {
    let kind = reader.get_value_kind().unwrap();
    let ty = reader.get_handle().unwrap();
    let underlying = reader.get_handle().unwrap();
    let sort = reader.get_sort().unwrap();
    let payload = match kind {
        ValueKind::Parameter | ValueKind::FreeVariable => Payload::Index(reader.get_i32().unwrap()),
        ValueKind::Local => Payload::Local(reader.get_handle().unwrap()),
        ValueKind::Const => match sort {
            Sort::Bool => Payload::Bool(reader.get_bool().unwrap()),
            Sort::Int8 => Payload::Int(reader.get_i8().unwrap().into()),
            Sort::Int16 => Payload::Int(reader.get_i16().unwrap().into()),
            Sort::Int32 => Payload::Int(reader.get_i32().unwrap().into()),
            Sort::Int64 => Payload::Int(reader.get_i64().unwrap()),
            Sort::Uint8 => Payload::Uint(reader.get_u8().unwrap().into()),
            Sort::Uint16 => Payload::Uint(reader.get_u16().unwrap().into()),
            Sort::Uint32 => Payload::Uint(reader.get_u32().unwrap().into()),
            Sort::Uint64 => Payload::Uint(reader.get_u64().unwrap()),
            Sort::Float32 => Payload::Float(reader.get_f32().unwrap().into()),
            Sort::Float64 => Payload::Float(reader.get_f64().unwrap()),
            Sort::String => Payload::Str(reader.get_string().unwrap()),
            _ => Payload::Nil,
        },
        ValueKind::Illegal => panic!("illegal operand"),
    };
    Operand {
        kind,
        ty,
        underlying,
        sort,
        payload,
    }
}
