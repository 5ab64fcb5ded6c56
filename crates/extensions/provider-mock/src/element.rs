use std::collections::BTreeMap;

use autorpa_protocols::BoundingBox;

/// Canned element returned by `query_all`.
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    pub tag_name: String,
    pub text: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub bounding_box: Option<BoundingBox>,
    /// Detail lookups on a detached element fail.
    pub detached: bool,
}

impl MockElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            text: None,
            attributes: BTreeMap::new(),
            bounding_box: None,
            detached: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox {
            x,
            y,
            width,
            height,
        });
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }
}
