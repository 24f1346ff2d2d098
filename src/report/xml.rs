#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Just enough of an XML tree to read surefire reports.

/// A parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Tag name.
    pub name:       String,
    /// Attributes, in document order, values already unescaped.
    pub attributes: Vec<(String, String)>,
    /// Child elements, in document order.
    pub children:   Vec<XmlElement>,
    /// Concatenated character data and CDATA sections directly under this
    /// element.
    pub text:       String,
}

/// One piece of element content, as produced by the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// A nested element.
    Element(XmlElement),
    /// Character data or a CDATA section.
    Text(String),
    /// Comments and processing instructions.
    Ignored,
}

impl XmlElement {
    /// Assembles an element from its tag, attributes and content.
    pub fn new(name: &str, attributes: Vec<(String, String)>, content: Vec<XmlNode>) -> Self {
        let mut element = XmlElement {
            name: name.to_string(),
            attributes,
            ..Default::default()
        };
        for node in content {
            match node {
                XmlNode::Element(child) => element.children.push(child),
                XmlNode::Text(text) => element.text.push_str(&text),
                XmlNode::Ignored => {}
            }
        }
        element
    }

    /// Returns the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first child with the given tag.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Iterates over the children with the given tag.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// Decodes the predefined XML entities and character references.
pub fn unescape(raw: &str) -> Result<String, &'static str> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';').ok_or("entity terminated by `;`")?;
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).map_err(|_| "hexadecimal character reference")?
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>()
                        .map_err(|_| "decimal character reference")?
                } else {
                    return Err("known XML entity");
                };
                char::from_u32(code).ok_or("valid unicode scalar")?
            }
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
