//! Declarative argument schemas for operations.
//!
//! An [`OperationSchema`] is an ordered list of [`FieldSchema`] entries plus
//! any cross-field [`Precondition`]s. Schemas are built once when the
//! operation table is assembled and are read-only afterwards. They drive both
//! argument validation and the JSON Schema published to clients.

use serde_json::{Map, Value, json};

/// JSON type accepted by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    StringArray,
    IntegerArray,
}

impl FieldKind {
    /// Name used in validation messages and JSON Schema `type`.
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::StringArray | FieldKind::IntegerArray => "array",
        }
    }

    /// Item type for array kinds.
    pub fn item_type(&self) -> Option<&'static str> {
        match self {
            FieldKind::StringArray => Some("string"),
            FieldKind::IntegerArray => Some("integer"),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.item_type().is_some()
    }
}

/// Constraints for one named argument.
///
/// Bounds are inclusive. For array kinds `minimum`/`maximum` and
/// `allowed_values` apply to every item, while `min_items`/`max_items` bound
/// the array length.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
    pub required: bool,
    pub allowed_values: &'static [&'static str],
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub default: Option<Value>,
}

impl FieldSchema {
    fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            allowed_values: &[],
            minimum: None,
            maximum: None,
            min_items: None,
            max_items: None,
            default: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::String, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Integer, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Number, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean, description)
    }

    pub fn string_array(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::StringArray, description)
    }

    pub fn integer_array(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::IntegerArray, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict values (or array items) to an exact, case-sensitive set.
    pub fn one_of(mut self, allowed_values: &'static [&'static str]) -> Self {
        self.allowed_values = allowed_values;
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Bound the number of items in an array field.
    pub fn items(mut self, min_items: usize, max_items: usize) -> Self {
        self.min_items = Some(min_items);
        self.max_items = Some(max_items);
        self
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(self.kind.json_type()));
        property.insert("description".to_string(), json!(self.description));

        let mut item_constraints = Map::new();
        let target = if let Some(item_type) = self.kind.item_type() {
            item_constraints.insert("type".to_string(), json!(item_type));
            if let Some(min_items) = self.min_items {
                property.insert("minItems".to_string(), json!(min_items));
            }
            if let Some(max_items) = self.max_items {
                property.insert("maxItems".to_string(), json!(max_items));
            }
            &mut item_constraints
        } else {
            &mut property
        };

        if !self.allowed_values.is_empty() {
            target.insert("enum".to_string(), json!(self.allowed_values));
        }
        let integral = matches!(self.kind, FieldKind::Integer | FieldKind::IntegerArray);
        if let Some(minimum) = self.minimum {
            target.insert("minimum".to_string(), bound_value(minimum, integral));
        }
        if let Some(maximum) = self.maximum {
            target.insert("maximum".to_string(), bound_value(maximum, integral));
        }

        if self.kind.is_array() {
            property.insert("items".to_string(), Value::Object(item_constraints));
        }
        if let Some(default) = self.default.as_ref() {
            property.insert("default".to_string(), default.clone());
        }
        Value::Object(property)
    }
}

fn bound_value(bound: f64, integral: bool) -> Value {
    if integral && bound.fract() == 0.0 {
        json!(bound as i64)
    } else {
        json!(bound)
    }
}

/// Cross-field requirement that cannot be expressed on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// At least one group must have every one of its fields present.
    AnyOf(Vec<Vec<&'static str>>),
}

impl Precondition {
    pub fn any_of(groups: &[&[&'static str]]) -> Self {
        Precondition::AnyOf(groups.iter().map(|group| group.to_vec()).collect())
    }

    /// Human-readable rendering such as "`gene_id`, or `gene_symbol` together with `organism`".
    pub fn describe(&self) -> String {
        match self {
            Precondition::AnyOf(groups) => groups
                .iter()
                .map(|group| {
                    group
                        .iter()
                        .map(|field| format!("`{field}`"))
                        .collect::<Vec<String>>()
                        .join(" together with ")
                })
                .collect::<Vec<String>>()
                .join(", or "),
        }
    }
}

/// Ordered field list plus preconditions for one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSchema {
    pub fields: Vec<FieldSchema>,
    pub preconditions: Vec<Precondition>,
}

impl OperationSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Render the schema as a JSON Schema object suitable for tool listings.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let properties = self
            .fields
            .iter()
            .map(|field| (field.name.to_string(), field.to_json_schema()))
            .collect::<Map<String, Value>>();
        let required = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| Value::String(field.name.to_string()))
            .collect::<Vec<Value>>();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        if !self.preconditions.is_empty() {
            let notes = self
                .preconditions
                .iter()
                .map(|precondition| format!("Provide {}.", precondition.describe()))
                .collect::<Vec<String>>()
                .join(" ");
            schema.insert("description".to_string(), json!(notes));
        }
        schema
    }
}
