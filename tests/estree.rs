//! Tests for ESTree JSON output
//!
//! End-to-end checks of the serialized tree: node shapes, metadata
//! toggles, and stability of the emitted JSON.

#![allow(clippy::unwrap_used, clippy::panic)]

use esparse::{ParseOptions, estree, parse, parse_script};
use serde_json::{Value, json};

fn emit(source: &str, options: &ParseOptions) -> Value {
    let program = parse(source, options).unwrap();
    estree::to_json(&program, options)
}

fn emit_default(source: &str) -> Value {
    emit(source, &ParseOptions::default())
}

#[test]
fn test_program_skeleton() {
    let json = emit_default("var a = 1;");
    assert_eq!(json["type"], "Program");
    assert_eq!(json["sourceType"], "script");
    assert_eq!(json["body"][0]["type"], "VariableDeclaration");
    assert_eq!(json["body"][0]["kind"], "var");
    assert_eq!(json["body"][0]["declarations"][0]["type"], "VariableDeclarator");
    assert_eq!(json["body"][0]["declarations"][0]["id"]["name"], "a");
    assert_eq!(json["body"][0]["declarations"][0]["init"]["value"], json!(1.0));
}

#[test]
fn test_module_source_type() {
    let options = ParseOptions {
        module: true,
        ..ParseOptions::default()
    };
    let json = emit("export default 1;", &options);
    assert_eq!(json["sourceType"], "module");
    assert_eq!(json["body"][0]["type"], "ExportDefaultDeclaration");
}

#[test]
fn test_operator_strings() {
    let json = emit_default("a === b; c >>>= d; !e; f instanceof g;");
    assert_eq!(json["body"][0]["expression"]["operator"], "===");
    assert_eq!(json["body"][1]["expression"]["operator"], ">>>=");
    assert_eq!(json["body"][2]["expression"]["operator"], "!");
    assert_eq!(json["body"][3]["expression"]["operator"], "instanceof");
}

#[test]
fn test_member_expression_shape() {
    let json = emit_default("a.b; a[b];");
    assert_eq!(json["body"][0]["expression"]["computed"], json!(false));
    assert_eq!(json["body"][1]["expression"]["computed"], json!(true));
    assert_eq!(json["body"][0]["expression"]["property"]["type"], "Identifier");
}

#[test]
fn test_function_flags() {
    let json = emit_default("function f() {} function* g() {} async function h() {}");
    assert_eq!(json["body"][0]["generator"], json!(false));
    assert_eq!(json["body"][0]["async"], json!(false));
    assert_eq!(json["body"][0]["expression"], json!(false));
    assert_eq!(json["body"][1]["generator"], json!(true));
    assert_eq!(json["body"][2]["async"], json!(true));
}

#[test]
fn test_method_definition_shape() {
    let json = emit_default("class A { static m() {} get p() {} }");
    let members = &json["body"][0]["body"]["body"];
    assert_eq!(members[0]["type"], "MethodDefinition");
    assert_eq!(members[0]["static"], json!(true));
    assert_eq!(members[0]["kind"], "method");
    assert_eq!(members[0]["value"]["type"], "FunctionExpression");
    assert_eq!(members[1]["kind"], "get");
    assert_eq!(members[1]["static"], json!(false));
}

#[test]
fn test_import_specifier_types() {
    let options = ParseOptions {
        module: true,
        ..ParseOptions::default()
    };
    let json = emit("import d, * as ns from 'm'; import { a as b } from 'n';", &options);
    let first = &json["body"][0]["specifiers"];
    assert_eq!(first[0]["type"], "ImportDefaultSpecifier");
    assert_eq!(first[1]["type"], "ImportNamespaceSpecifier");
    let second = &json["body"][1]["specifiers"];
    assert_eq!(second[0]["type"], "ImportSpecifier");
    assert_eq!(second[0]["imported"]["name"], "a");
    assert_eq!(second[0]["local"]["name"], "b");
}

#[test]
fn test_holes_serialize_as_null() {
    let json = emit_default("[, a, ];");
    assert_eq!(json["body"][0]["expression"]["elements"][0], Value::Null);
    assert_eq!(json["body"][0]["expression"]["elements"][1]["name"], "a");
    assert_eq!(
        json["body"][0]["expression"]["elements"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_range_offsets_are_bytes() {
    let options = ParseOptions {
        ranges: true,
        ..ParseOptions::default()
    };
    // the literal contains a two-byte character
    let json = emit("'é'; x;", &options);
    assert_eq!(json["body"][0]["expression"]["range"], json!([0, 4]));
    assert_eq!(json["body"][1]["range"], json!([6, 8]));
}

#[test]
fn test_loc_lines_and_columns() {
    let options = ParseOptions {
        loc: true,
        ..ParseOptions::default()
    };
    let json = emit("a;\n  b;", &options);
    assert_eq!(json["body"][1]["loc"]["start"]["line"], json!(2));
    assert_eq!(json["body"][1]["loc"]["start"]["column"], json!(2));
    // lines are 1-based, columns 0-based
    assert_eq!(json["body"][0]["loc"]["start"]["line"], json!(1));
    assert_eq!(json["body"][0]["loc"]["start"]["column"], json!(0));
}

#[test]
fn test_metadata_appears_on_every_node() {
    let options = ParseOptions {
        ranges: true,
        loc: true,
        ..ParseOptions::default()
    };
    let json = emit("f(a + 1);", &options);
    fn check(value: &Value) {
        if let Some(map) = value.as_object() {
            if map.contains_key("type") {
                assert!(map.contains_key("range"), "missing range: {value}");
                assert!(map.contains_key("loc"), "missing loc: {value}");
            }
            for v in map.values() {
                check(v);
            }
        } else if let Some(items) = value.as_array() {
            for v in items {
                check(v);
            }
        }
    }
    check(&json);
}

#[test]
fn test_serialization_is_deterministic() {
    let options = ParseOptions {
        ranges: true,
        loc: true,
        ..ParseOptions::default()
    };
    let source = "class A extends B { m(x = 1) { return `v${x}`; } }";
    let a = serde_json::to_string(&emit(source, &options)).unwrap();
    let b = serde_json::to_string(&emit(source, &options)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_parse_options_serde_roundtrip() {
    let options = ParseOptions {
        module: true,
        ranges: true,
        max_depth: 64,
        ..ParseOptions::default()
    };
    let encoded = serde_json::to_string(&options).unwrap();
    let decoded: ParseOptions = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.module, options.module);
    assert_eq!(decoded.max_depth, options.max_depth);
    // missing fields fall back to the defaults
    let partial: ParseOptions = serde_json::from_str("{\"loc\": true}").unwrap();
    assert!(partial.loc);
    assert!(partial.raw);
    assert_eq!(partial.max_depth, 256);
}

#[test]
fn test_yield_and_await_nodes() {
    let json = emit_default("function* g() { yield; yield* a; } async function f() { await b; }");
    let gen_body = &json["body"][0]["body"]["body"];
    assert_eq!(gen_body[0]["expression"]["type"], "YieldExpression");
    assert_eq!(gen_body[0]["expression"]["argument"], Value::Null);
    assert_eq!(gen_body[0]["expression"]["delegate"], json!(false));
    assert_eq!(gen_body[1]["expression"]["delegate"], json!(true));
    let async_body = &json["body"][1]["body"]["body"];
    assert_eq!(async_body[0]["expression"]["type"], "AwaitExpression");
}

#[test]
fn test_new_without_arguments() {
    let json = emit_default("new A; new B(1);");
    assert_eq!(json["body"][0]["expression"]["arguments"], json!([]));
    assert_eq!(
        json["body"][1]["expression"]["arguments"][0]["value"],
        json!(1.0)
    );
}

#[test]
fn test_meta_properties() {
    let json = emit_default("function f() { new.target; }");
    let expr = &json["body"][0]["body"]["body"][0]["expression"];
    assert_eq!(expr["type"], "MetaProperty");
    assert_eq!(expr["meta"]["name"], "new");
    assert_eq!(expr["property"]["name"], "target");
}

#[test]
fn test_assignment_pattern_target_serializes_as_pattern() {
    let json = emit_default("({ a = 1 } = b);");
    let left = &json["body"][0]["expression"]["left"];
    assert_eq!(left["type"], "ObjectPattern");
    assert_eq!(left["properties"][0]["value"]["type"], "AssignmentPattern");
    assert_eq!(left["properties"][0]["shorthand"], json!(true));
}

#[test]
fn test_tagged_template_cooked_null_for_bad_escape() {
    let json = emit_default("tag`\\u{ZZ}`;");
    let quasi = &json["body"][0]["expression"]["quasi"]["quasis"][0];
    assert_eq!(quasi["value"]["cooked"], Value::Null);
    assert_eq!(quasi["value"]["raw"], "\\u{ZZ}");
}

#[test]
fn test_parse_script_helper_matches_default_options() {
    let program = parse_script("a;").unwrap();
    let via_parse = parse("a;", &ParseOptions::default()).unwrap();
    assert_eq!(program, via_parse);
}
