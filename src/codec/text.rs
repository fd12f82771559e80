//! Textual back end building and consuming JSON trees.
//!
//! Output accumulates an in-memory [`serde_json::Value`] rooted at an object
//! and renders it once at flush time. Input parses the whole tree up front;
//! scope operations descend by consuming children, so every node is read at
//! most once.

use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Number, Value};

use crate::codec::names::NameStack;
use crate::error::{Error, Result};

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Tree-building text encoder.
pub struct TextEncoder<'a> {
    sink: Box<dyn Write + 'a>,
    stack: Vec<Value>,
    names: NameStack,
    indent: Option<usize>,
    rendered: bool,
}

impl<'a> TextEncoder<'a> {
    pub(crate) fn new(sink: Box<dyn Write + 'a>, indent: Option<usize>) -> Self {
        Self {
            sink,
            stack: vec![Value::Object(Map::new())],
            names: NameStack::default(),
            indent,
            rendered: false,
        }
    }

    pub(crate) fn set_next_name(&mut self, name: &str) {
        self.names.push(name);
    }

    pub(crate) fn open_object(&mut self) {
        self.stack.push(Value::Object(Map::new()));
    }

    pub(crate) fn open_array(&mut self) {
        self.stack.push(Value::Array(Vec::new()));
    }

    /// Pops the current scope and attaches it to its parent under the next
    /// consumed name (object parent) or by appending (array parent).
    pub(crate) fn close_scope(&mut self) -> Result<()> {
        if self.stack.len() < 2 {
            return Err(Error::structural("scope close without a matching open"));
        }
        let node = self.stack.pop().expect("scope stack length checked above");
        self.attach(node)
    }

    fn attach(&mut self, node: Value) -> Result<()> {
        let parent = self
            .stack
            .last_mut()
            .ok_or_else(|| Error::structural("value emitted outside the root scope"))?;
        match parent {
            Value::Array(items) => items.push(node),
            Value::Object(map) => {
                let key = self.names.next();
                map.insert(key, node);
            }
            other => {
                return Err(Error::structural(format!(
                    "cannot attach a value to a {} node",
                    value_kind(other)
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn emit_unsigned(&mut self, value: u64) -> Result<()> {
        self.attach(Value::Number(Number::from(value)))
    }

    pub(crate) fn emit_signed(&mut self, value: i64) -> Result<()> {
        self.attach(Value::Number(Number::from(value)))
    }

    pub(crate) fn emit_float(&mut self, value: f64) -> Result<()> {
        let number = Number::from_f64(value)
            .ok_or_else(|| Error::structural("non-finite float is not representable in text"))?;
        self.attach(Value::Number(number))
    }

    pub(crate) fn emit_bool(&mut self, value: bool) -> Result<()> {
        self.attach(Value::Bool(value))
    }

    pub(crate) fn emit_str(&mut self, value: &str) -> Result<()> {
        self.attach(Value::String(value.to_owned()))
    }

    /// Byte spans become base64 string leaves.
    pub(crate) fn emit_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.attach(Value::String(BASE64.encode(bytes)))
    }

    /// Sequence lengths are implicit in array cardinality.
    pub(crate) fn emit_len(&mut self, _len: u64) -> Result<()> {
        Ok(())
    }

    /// Renders the accumulated tree to the sink, once, then flushes it.
    pub(crate) fn flush(&mut self) -> Result<()> {
        if !self.rendered {
            if self.stack.len() != 1 {
                return Err(Error::structural(format!(
                    "{} scope(s) left open at flush",
                    self.stack.len() - 1
                )));
            }
            let root = self.stack.pop().expect("root scope present");
            match self.indent {
                None => serde_json::to_writer(&mut self.sink, &root).map_err(Error::framing)?,
                Some(width) => {
                    let indent = vec![b' '; width];
                    let formatter = PrettyFormatter::with_indent(&indent);
                    let mut serializer = Serializer::with_formatter(&mut self.sink, formatter);
                    root.serialize(&mut serializer).map_err(Error::framing)?;
                }
            }
            self.rendered = true;
        }
        self.sink.flush()?;
        Ok(())
    }
}

struct Node {
    value: Value,
    cursor: usize,
}

impl Node {
    fn new(value: Value) -> Self {
        Self { value, cursor: 0 }
    }
}

/// Tree-consuming text decoder.
pub struct TextDecoder {
    stack: Vec<Node>,
    names: NameStack,
}

impl TextDecoder {
    /// Parses the whole tree from the source before any scope operation runs.
    pub(crate) fn new(source: impl Read) -> Result<Self> {
        let root: Value = serde_json::from_reader(source).map_err(Error::framing)?;
        Ok(Self {
            stack: vec![Node::new(root)],
            names: NameStack::default(),
        })
    }

    pub(crate) fn set_next_name(&mut self, name: &str) {
        self.names.push(name);
    }

    /// Consumes the next child of the current scope: by name when the scope
    /// is an object, positionally when it is an array.
    fn take_child(&mut self) -> Result<Value> {
        let node = self
            .stack
            .last_mut()
            .ok_or_else(|| Error::structural("value consumed outside the root scope"))?;
        match &mut node.value {
            Value::Object(map) => {
                let key = self.names.next();
                map.remove(&key)
                    .ok_or_else(|| Error::structural(format!("missing field `{key}`")))
            }
            Value::Array(items) => {
                let index = node.cursor;
                node.cursor += 1;
                items
                    .get_mut(index)
                    .map(std::mem::take)
                    .ok_or_else(|| {
                        Error::structural(format!("array exhausted at element {index}"))
                    })
            }
            other => Err(Error::structural(format!(
                "cannot read a child of a {} node",
                value_kind(other)
            ))),
        }
    }

    pub(crate) fn open_object(&mut self) -> Result<()> {
        let child = self.take_child()?;
        if !child.is_object() {
            return Err(Error::structural(format!(
                "expected an object scope, found {}",
                value_kind(&child)
            )));
        }
        self.stack.push(Node::new(child));
        Ok(())
    }

    pub(crate) fn open_array(&mut self) -> Result<()> {
        let child = self.take_child()?;
        if !child.is_array() {
            return Err(Error::structural(format!(
                "expected an array scope, found {}",
                value_kind(&child)
            )));
        }
        self.stack.push(Node::new(child));
        Ok(())
    }

    pub(crate) fn close_scope(&mut self) -> Result<()> {
        if self.stack.len() < 2 {
            return Err(Error::structural("scope close without a matching open"));
        }
        self.stack.pop();
        Ok(())
    }

    pub(crate) fn consume_unsigned(&mut self) -> Result<u64> {
        let child = self.take_child()?;
        child.as_u64().ok_or_else(|| {
            Error::structural(format!(
                "expected an unsigned number, found {}",
                value_kind(&child)
            ))
        })
    }

    pub(crate) fn consume_signed(&mut self) -> Result<i64> {
        let child = self.take_child()?;
        child.as_i64().ok_or_else(|| {
            Error::structural(format!(
                "expected a signed number, found {}",
                value_kind(&child)
            ))
        })
    }

    pub(crate) fn consume_float(&mut self) -> Result<f64> {
        let child = self.take_child()?;
        child.as_f64().ok_or_else(|| {
            Error::structural(format!("expected a number, found {}", value_kind(&child)))
        })
    }

    pub(crate) fn consume_bool(&mut self) -> Result<bool> {
        let child = self.take_child()?;
        child.as_bool().ok_or_else(|| {
            Error::structural(format!("expected a boolean, found {}", value_kind(&child)))
        })
    }

    pub(crate) fn consume_str(&mut self) -> Result<String> {
        let child = self.take_child()?;
        match child {
            Value::String(text) => Ok(text),
            other => Err(Error::structural(format!(
                "expected a string, found {}",
                value_kind(&other)
            ))),
        }
    }

    pub(crate) fn consume_bytes(&mut self) -> Result<Vec<u8>> {
        let encoded = self.consume_str()?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(|err| Error::structural(format!("invalid base64 byte span: {err}")))
    }

    /// Reports the cardinality of the array scope just entered.
    pub(crate) fn consume_len(&mut self) -> Result<u64> {
        let node = self
            .stack
            .last()
            .ok_or_else(|| Error::structural("length consumed outside the root scope"))?;
        match &node.value {
            Value::Array(items) => Ok(items.len() as u64),
            other => Err(Error::structural(format!(
                "sequence length requested while the current scope is a {}",
                value_kind(other)
            ))),
        }
    }
}
