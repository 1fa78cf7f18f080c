// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Extracting elements from a markup stream
//!
//! The body is pulled through a streaming reader. Every element whose name
//! matches the token is re-serialized on its own, and namespace declarations
//! from the selected ancestors are copied onto it so each fragment stays
//! well-formed when read in isolation.

use super::FragmentResult;
use super::config::element_name;
use crate::error::{ExpressionError, ExpressionResult};
use crate::model::BoxedReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use smallvec::SmallVec;
use std::fmt;
use std::io::BufReader;

/// Inherit declarations from every ancestor
pub const INHERIT_ALL: &str = "*";

type XmlReader = Reader<BufReader<BoxedReader>>;

/// `xmlns` attribute name and value, both raw
type Declaration = (Vec<u8>, Vec<u8>);

/// Which ancestors contribute namespace declarations to each fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceInheritance {
    /// Every enclosing element
    All,
    /// Enclosing elements with this qualified or local name
    From(Vec<u8>),
}

impl NamespaceInheritance {
    /// Parse an `inheritNamespaceTagName` value
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            INHERIT_ALL => NamespaceInheritance::All,
            other => NamespaceInheritance::From(element_name(other).as_bytes().to_vec()),
        }
    }

    fn applies_to(&self, ancestor: &Ancestor) -> bool {
        match self {
            NamespaceInheritance::All => true,
            NamespaceInheritance::From(name) => ancestor.name == *name || ancestor.local == *name,
        }
    }
}

struct Ancestor {
    name: Vec<u8>,
    local: Vec<u8>,
    declarations: SmallVec<[Declaration; 2]>,
}

impl Ancestor {
    fn from_start(start: &BytesStart<'_>, reader: &XmlReader) -> ExpressionResult<Self> {
        let mut declarations = SmallVec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| xml_error(reader, err))?;
            if is_namespace_declaration(attribute.key.as_ref()) {
                declarations.push((attribute.key.as_ref().to_vec(), attribute.value.into_owned()));
            }
        }
        Ok(Self {
            name: start.name().as_ref().to_vec(),
            local: start.local_name().as_ref().to_vec(),
            declarations,
        })
    }
}

/// Streams each matching element as a standalone fragment
pub struct XmlSplitter {
    reader: Option<XmlReader>,
    element: Vec<u8>,
    inherit: Option<NamespaceInheritance>,
    ancestors: Vec<Ancestor>,
    max_fragment: Option<usize>,
}

impl XmlSplitter {
    /// Split `source` on elements named `element`, given bare or as `<element>`
    pub fn new(
        source: BoxedReader,
        element: &str,
        inherit: Option<NamespaceInheritance>,
        buffer_size: usize,
        max_fragment: Option<usize>,
    ) -> Self {
        let mut reader = Reader::from_reader(BufReader::with_capacity(buffer_size.max(1), source));
        reader.trim_text(false).expand_empty_elements(false);
        Self {
            reader: Some(reader),
            element: element_name(element).as_bytes().to_vec(),
            inherit,
            ancestors: Vec::new(),
            max_fragment,
        }
    }

    fn next_fragment(&mut self) -> ExpressionResult<Option<Vec<u8>>> {
        let Self {
            reader,
            element,
            inherit,
            ancestors,
            max_fragment,
        } = self;
        let Some(reader) = reader.as_mut() else {
            return Ok(None);
        };

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|err| xml_error(reader, err))?;
            match event {
                Event::Start(start) if is_target(element, &start) => {
                    let start = with_inherited(start.into_owned(), inherit.as_ref(), ancestors);
                    return capture(reader, start, *max_fragment).map(Some);
                }
                Event::Start(start) => {
                    let ancestor = Ancestor::from_start(&start, reader)?;
                    ancestors.push(ancestor);
                }
                Event::Empty(start) if is_target(element, &start) => {
                    let start = with_inherited(start.into_owned(), inherit.as_ref(), ancestors);
                    let mut writer = Writer::new(Vec::new());
                    writer
                        .write_event(Event::Empty(start))
                        .map_err(|err| xml_error(reader, err))?;
                    return Ok(Some(writer.into_inner()));
                }
                Event::End(_) => {
                    ancestors.pop();
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for XmlSplitter {
    type Item = FragmentResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.as_ref()?;
        let result = self.next_fragment();
        if !matches!(result, Ok(Some(_))) {
            self.reader = None;
            self.ancestors.clear();
        }
        result.transpose()
    }
}

/// Copy the rest of the element opened by `start` into its own document
fn capture(
    reader: &mut XmlReader,
    start: BytesStart<'static>,
    max_fragment: Option<usize>,
) -> ExpressionResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Start(start))
        .map_err(|err| xml_error(reader, err))?;

    let mut buf = Vec::new();
    let mut depth = 1usize;
    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(reader, err))?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(xml_error(reader, "unexpected end of input inside element"));
            }
            _ => {}
        }
        writer
            .write_event(event)
            .map_err(|err| xml_error(reader, err))?;
        if depth == 0 {
            return Ok(writer.into_inner());
        }
        if let Some(max) = max_fragment {
            if writer.get_ref().len() > max {
                return Err(ExpressionError::evaluation(format!(
                    "fragment exceeds the maximum size of {max} bytes"
                )));
            }
        }
    }
}

/// Add ancestor namespace declarations the element does not already carry
///
/// Nearer ancestors win over farther ones for the same prefix.
fn with_inherited(
    mut start: BytesStart<'static>,
    inherit: Option<&NamespaceInheritance>,
    ancestors: &[Ancestor],
) -> BytesStart<'static> {
    let Some(inherit) = inherit else {
        return start;
    };
    let mut declared: SmallVec<[Vec<u8>; 4]> = start
        .attributes()
        .flatten()
        .map(|attribute| attribute.key.as_ref().to_vec())
        .filter(|key| is_namespace_declaration(key))
        .collect();

    for ancestor in ancestors.iter().rev().filter(|ancestor| inherit.applies_to(ancestor)) {
        for (key, value) in &ancestor.declarations {
            if declared.contains(key) {
                continue;
            }
            start.push_attribute((key.as_slice(), value.as_slice()));
            declared.push(key.clone());
        }
    }
    start
}

fn is_target(element: &[u8], start: &BytesStart<'_>) -> bool {
    start.name().as_ref() == element || start.local_name().as_ref() == element
}

fn is_namespace_declaration(key: &[u8]) -> bool {
    key == b"xmlns" || key.starts_with(b"xmlns:")
}

fn xml_error<R>(reader: &Reader<R>, err: impl fmt::Display) -> ExpressionError {
    ExpressionError::Xml {
        position: reader.buffer_position(),
        message: err.to_string(),
    }
}
