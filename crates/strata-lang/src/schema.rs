//! Declarative schemas for querying bodies.

/// A single attribute a schema expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: String,
    pub required: bool,
}

impl AttributeSchema {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// The shape of a block header: a type name plus ordered label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeaderSchema {
    pub type_name: String,
    pub label_names: Vec<String>,
}

impl BlockHeaderSchema {
    pub fn new<L, S>(type_name: impl Into<String>, label_names: L) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_name: type_name.into(),
            label_names: label_names.into_iter().map(Into::into).collect(),
        }
    }
}

/// What a caller expects to find inside a body.
///
/// Anything outside the schema is either reported (full content) or left for
/// a later call (partial content).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodySchema {
    pub attributes: Vec<AttributeSchema>,
    pub blocks: Vec<BlockHeaderSchema>,
}

impl BodySchema {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_constructors() {
        assert!(AttributeSchema::required("name").required);
        assert!(!AttributeSchema::optional("count").required);
    }

    #[test]
    fn block_header_labels_keep_order() {
        let block = BlockHeaderSchema::new("resource", ["type", "name"]);
        assert_eq!(block.type_name, "resource");
        assert_eq!(block.label_names, vec!["type", "name"]);
    }

    #[test]
    fn block_header_without_labels() {
        let block = BlockHeaderSchema::new("locals", Vec::<String>::new());
        assert!(block.label_names.is_empty());
    }
}
