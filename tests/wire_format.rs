//! Wire Format Tests
//!
//! Decoding and encoding of XML-RPC documents, driven by canned responses
//! from real servers and by values pushed through the encoder.

mod fixtures;

use chrono::{FixedOffset, TimeZone, Utc};
use xmlrpc_wire::protocol::envelope::{marshal_call, read_call, read_response, unmarshal, Message};
use xmlrpc_wire::protocol::{decode, encode};
use xmlrpc_wire::{DecodeError, Error, Struct, Value};

fn members(pairs: &[(&str, Value)]) -> Value {
    Value::Struct(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<Struct>(),
    )
}

fn array(items: Vec<Value>) -> Value {
    Value::Array(items)
}

fn read_fixture(name: &str) -> Vec<Value> {
    read_response(fixtures::response(name).as_slice()).unwrap()
}

// =============================================================================
// Scalars
// =============================================================================

#[test]
fn test_typed_scalars_survive_encode_and_decode() {
    let values = [
        Value::Integer(-42),
        Value::Integer(i64::MAX),
        Value::Double(3.25),
        Value::Double(-0.5),
        Value::String("<sip:raf@192.168.164.128:5060>;expires=60 & more".into()),
        Value::String(String::new()),
        Value::Boolean(true),
        Value::Boolean(false),
        Value::Binary(vec![0, 1, 2, 254, 255]),
    ];

    for value in values {
        let markup = encode::to_string(&value, true).unwrap();
        let decoded = decode::from_str(&markup).unwrap();
        assert_eq!(decoded, value, "through {markup}");
    }
}

#[test]
fn test_boolean_literals() {
    for literal in ["1", "true"] {
        let xml = format!("<boolean>{literal}</boolean>");
        assert_eq!(decode::from_str(&xml).unwrap(), Value::Boolean(true));
    }
    for literal in ["0", "false"] {
        let xml = format!("<boolean>{literal}</boolean>");
        assert_eq!(decode::from_str(&xml).unwrap(), Value::Boolean(false));
    }

    let err = decode::from_str("<boolean>yes</boolean>").unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::InvalidBoolean(ref s)) if s == "yes"));
}

#[test]
fn test_untyped_value_text_is_string() {
    assert_eq!(decode::from_str("<value>OK</value>").unwrap(), Value::from("OK"));
}

#[test]
fn test_binary_is_base64_in_either_mode() {
    let value = Value::Binary(b"any carnal pleas".to_vec());
    for typed in [true, false] {
        assert_eq!(
            encode::to_string(&value, typed).unwrap(),
            "<base64>YW55IGNhcm5hbCBwbGVhcw==</base64>"
        );
    }
}

#[test]
fn test_datetime_primary_and_fallback_formats() {
    let utc = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap().fixed_offset();
    assert_eq!(
        decode::from_str("<dateTime.iso8601>20060102T15:04:05</dateTime.iso8601>").unwrap(),
        Value::DateTime(utc)
    );
    assert_eq!(
        decode::from_str("<dateTime.iso8601>2006-01-02T15:04:05</dateTime.iso8601>").unwrap(),
        Value::DateTime(utc)
    );

    let mountain = FixedOffset::west_opt(7 * 3600)
        .unwrap()
        .with_ymd_and_hms(2006, 1, 2, 15, 4, 5)
        .unwrap();
    let decoded = decode::from_str("<dateTime.iso8601>2006-01-02T15:04:05-07:00</dateTime.iso8601>")
        .unwrap();
    assert_eq!(decoded, Value::DateTime(mountain));
    assert_eq!(decoded.as_datetime().unwrap().offset(), mountain.offset());
}

#[test]
fn test_datetime_encodes_primary_format_only() {
    let value = Value::from(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
    let markup = encode::to_string(&value, false).unwrap();
    assert_eq!(markup, "<dateTime.iso8601>20060102T15:04:05</dateTime.iso8601>");
    assert_eq!(decode::from_str(&markup).unwrap(), value);
}

// =============================================================================
// Structs and arrays
// =============================================================================

#[test]
fn test_struct_equality_ignores_member_order() {
    let forward = decode::from_str(
        "<struct>\
           <member><name>foo</name><value>bar</value></member>\
           <member><name>num</name><value><i4>12345</i4></value></member>\
         </struct>",
    )
    .unwrap();
    let backward = decode::from_str(
        "<struct>\
           <member><name>num</name><value><int>12345</int></value></member>\
           <member><name>foo</name><value><string>bar</string></value></member>\
         </struct>",
    )
    .unwrap();

    assert_eq!(forward, backward);
    assert_eq!(
        forward,
        members(&[("foo", Value::from("bar")), ("num", Value::Integer(12345))])
    );
}

#[test]
fn test_array_of_loose_and_typed_values() {
    let decoded = decode::from_str(
        "<array>
           <data>
             <value>foo</value>
             <value><i4>1</i4></value>
             <value>
               <struct>
                 <member><name>foo</name><value>bar</value></member>
                 <member><name>num</name><value><i4>12345</i4></value></member>
                 <member><name>bla</name><value>blub</value></member>
               </struct>
             </value>
             <value><i4>3</i4></value>
             <value>blub</value>
             <value><nil/></value>
             <value>foo</value>
           </data>
         </array>",
    )
    .unwrap();

    assert_eq!(
        decoded,
        array(vec![
            Value::from("foo"),
            Value::Integer(1),
            members(&[
                ("foo", Value::from("bar")),
                ("num", Value::Integer(12345)),
                ("bla", Value::from("blub")),
            ]),
            Value::Integer(3),
            Value::from("blub"),
            Value::Nil,
            Value::from("foo"),
        ])
    );
}

#[test]
fn test_struct_array_response() {
    let results = read_fixture("struct_array");
    assert_eq!(results.len(), 1);

    let rows = results[0].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    let labels: Vec<&str> = rows
        .iter()
        .map(|row| row.get("test1").and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(labels, ["a", "b", "c"]);
    assert!(rows.iter().all(|row| row.get("test2") == Some(&Value::Integer(2))));
}

#[test]
fn test_int_array_response() {
    assert_eq!(
        read_fixture("int_array"),
        vec![array(vec![Value::Integer(2), Value::Integer(3), Value::Integer(4)])]
    );
}

#[test]
fn test_mixed_array_response() {
    let results = read_fixture("mixed_array");
    let items = results[0].as_array().unwrap();
    let kinds: Vec<&str> = items.iter().map(|v| v.kind().as_str()).collect();
    assert_eq!(kinds, ["struct", "int", "struct", "int"]);
    assert_eq!(items[3], Value::Integer(4));
}

#[test]
fn test_raw_string_struct_response() {
    assert_eq!(
        read_fixture("raw_string_struct"),
        vec![array(vec![
            Value::Integer(200),
            Value::from("OK"),
            members(&[
                ("status", Value::from("OK")),
                ("contact", Value::from("<sip:raf@192.168.164.128:5060>;expires=60")),
            ]),
        ])]
    );
}

#[test]
fn test_raw_string_array_response() {
    assert_eq!(
        read_fixture("raw_string_array"),
        vec![array(vec![Value::from("500"), Value::from("Call Agent does not exist")])]
    );
}

#[test]
fn test_raw_string_nested_array_response() {
    assert_eq!(
        read_fixture("raw_string_nested_array"),
        vec![array(vec![
            array(vec![
                Value::from("212.79.111.155"),
                Value::Integer(5040),
                Value::Integer(3509720),
            ]),
            array(vec![
                Value::from("192.168.164.1"),
                Value::Integer(5060),
                Value::Integer(7122760),
            ]),
        ])]
    );
}

// =============================================================================
// Envelopes and faults
// =============================================================================

#[test]
fn test_fault_response_is_an_error() {
    let err = read_response(fixtures::response("fault").as_slice()).unwrap_err();
    let fault = err.as_fault().expect("fault error");
    assert_eq!(fault.code, 4);
    assert_eq!(fault.message, "Too many parameters.");
    assert_eq!(err.to_string(), "4: Too many parameters.");
}

#[test]
fn test_fault_with_string_code() {
    let xml = "<methodResponse><fault><value><struct>\
               <member><name>faultCode</name><value><string> 17 </string></value></member>\
               <member><name>faultString</name><value>busy</value></member>\
               </struct></value></fault></methodResponse>";
    let err = read_response(xml.as_bytes()).unwrap_err();
    assert_eq!(err.as_fault().map(|f| f.code), Some(17));
}

#[test]
fn test_add_int_call_markup_and_server_decode() {
    let body = marshal_call("AddInt", &(1, 2)).unwrap();
    let markup = String::from_utf8(body.clone()).unwrap();
    assert!(markup.starts_with("<?xml version=\"1.0\"?><methodCall><methodName>AddInt</methodName>"));
    assert!(markup.contains("<param><value><int>1</int></value></param><param><value><int>2</int></value></param>"));

    let call = read_call(body.as_slice()).unwrap();
    assert_eq!(call.method_name, "AddInt");
    assert_eq!(call.params, vec![Value::Integer(1), Value::Integer(2)]);
}

#[test]
fn test_unmarshal_distinguishes_call_from_response() {
    let call = marshal_call("Ping", &()).unwrap();
    assert!(matches!(unmarshal(call.as_slice()).unwrap(), Message::Call(c) if c.params.is_empty()));

    let response = fixtures::response("int_array");
    assert!(matches!(unmarshal(response.as_slice()).unwrap(), Message::Response(p) if p.len() == 1));
}

#[test]
fn test_structural_violations_fail_fast() {
    let cases = [
        "<methodResponse><params><param><value><array><value>1</value></array></value></param></params></methodResponse>",
        "<methodResponse><params><param><value><struct><name>x</name></struct></value></param></params></methodResponse>",
        "<methodResponse><params><param><value><int>1.5</int></value></param></params></methodResponse>",
        "<methodResponse><params><param><value><double>abc</double></value></param></params></methodResponse>",
        "<methodResponse><params><param><value><base64>!!!</base64></value></param></params></methodResponse>",
    ];
    for xml in cases {
        let err = read_response(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{xml}: {err}");
    }
}
