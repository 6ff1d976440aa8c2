// Declarative form fields and validation rules

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Number,
    Select,
    Textarea,
    Checkbox,
    Url,
}

#[derive(Debug, Clone)]
pub enum Rule {
    Required(String),
    MinLength(usize, String),
    MaxLength(usize, String),
    Min(f64, String),
    Max(f64, String),
    Pattern(Regex, String),
    /// Every pattern must match somewhere in the value.
    ContainsAll(Vec<Regex>, String),
    /// Value must equal another field's value.
    Matches(String, String),
}

impl Rule {
    pub fn email() -> Rule {
        Rule::Pattern(
            cached(&EMAIL, r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$"),
            "Please enter a valid email address".to_string(),
        )
    }

    pub fn url() -> Rule {
        Rule::Pattern(
            cached(&URL, r"^https?://.+"),
            "Please enter a valid URL".to_string(),
        )
    }

    pub fn password_strength() -> Rule {
        Rule::ContainsAll(
            vec![
                cached(&LOWER, "[a-z]"),
                cached(&UPPER, "[A-Z]"),
                cached(&DIGIT, r"\d"),
            ],
            "Password must contain upper and lower case letters and a digit".to_string(),
        )
    }

    fn message(&self) -> &str {
        match self {
            Rule::Required(m)
            | Rule::MinLength(_, m)
            | Rule::MaxLength(_, m)
            | Rule::Min(_, m)
            | Rule::Max(_, m)
            | Rule::Pattern(_, m)
            | Rule::ContainsAll(_, m)
            | Rule::Matches(_, m) => m,
        }
    }

    fn check(&self, value: &Value, values: &Map<String, Value>) -> bool {
        match self {
            Rule::Required(_) => !is_blank(value),
            Rule::MinLength(n, _) => text(value).chars().count() >= *n,
            Rule::MaxLength(n, _) => text(value).chars().count() <= *n,
            Rule::Min(min, _) => number(value).is_some_and(|v| v >= *min),
            Rule::Max(max, _) => number(value).is_some_and(|v| v <= *max),
            Rule::Pattern(re, _) => re.is_match(&text(value)),
            Rule::ContainsAll(patterns, _) => {
                let text = text(value);
                patterns.iter().all(|re| re.is_match(&text))
            }
            Rule::Matches(other, _) => values.get(other).unwrap_or(&Value::Null) == value,
        }
    }
}

static EMAIL: OnceLock<Regex> = OnceLock::new();
static URL: OnceLock<Regex> = OnceLock::new();
static LOWER: OnceLock<Regex> = OnceLock::new();
static UPPER: OnceLock<Regex> = OnceLock::new();
static DIGIT: OnceLock<Regex> = OnceLock::new();

// Patterns are literals above; a failure here is a programming error.
fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid built-in pattern"))
        .clone()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Bool(b) => !b,
        _ => false,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// `(value, label)` pairs for select fields.
    pub options: Vec<(String, String)>,
    pub rules: Vec<Rule>,
    /// Starting value; `None` means the blank value for the field kind.
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Field {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            options: Vec::new(),
            rules: Vec::new(),
            default: None,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, message: &str) -> Self {
        self.required = true;
        self.rules.insert(0, Rule::Required(message.to_string()));
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(v, l)| (v.to_string(), l.to_string()))
            .collect();
        self
    }

    /// First failing rule's message. Blank optional fields pass.
    pub fn validate(&self, values: &Map<String, Value>) -> Option<&str> {
        let value = values.get(&self.name).unwrap_or(&Value::Null);
        if !self.required && is_blank(value) {
            return None;
        }
        self.rules
            .iter()
            .find(|rule| !rule.check(value, values))
            .map(|rule| rule.message())
    }
}

/// Field name to error message, for every failing field.
pub type FormErrors = BTreeMap<String, String>;

/// A form's fields in display order. Values arrive as a JSON object, the
/// shape in which per-tab form state is persisted.
#[derive(Debug, Clone)]
pub struct FormSpec {
    pub name: String,
    pub title: String,
    pub fields: Vec<Field>,
}

impl FormSpec {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self, values: &Map<String, Value>) -> FormErrors {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .validate(values)
                    .map(|msg| (field.name.clone(), msg.to_string()))
            })
            .collect()
    }

    /// Starting values for every field, the shape a fresh form starts from.
    pub fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| {
                let value = f.default.clone().unwrap_or_else(|| match f.kind {
                    FieldKind::Checkbox => Value::Bool(false),
                    FieldKind::Number => Value::from(0),
                    _ => Value::String(String::new()),
                });
                (f.name.clone(), value)
            })
            .collect()
    }
}

pub fn user_form() -> FormSpec {
    FormSpec {
        name: "user".to_string(),
        title: "User Information".to_string(),
        fields: vec![
            Field::new("username", "Username", FieldKind::Text)
                .required("Username is required")
                .rule(Rule::MinLength(2, "Username must be at least 2 characters".to_string()))
                .rule(Rule::MaxLength(20, "Username must be at most 20 characters".to_string())),
            Field::new("email", "Email", FieldKind::Email)
                .required("Email is required")
                .rule(Rule::email()),
            Field::new("password", "Password", FieldKind::Password)
                .required("Password is required")
                .rule(Rule::MinLength(8, "Password must be at least 8 characters".to_string()))
                .rule(Rule::password_strength()),
            Field::new("confirmPassword", "Confirm Password", FieldKind::Password)
                .required("Password confirmation is required")
                .rule(Rule::Matches(
                    "password".to_string(),
                    "Passwords do not match".to_string(),
                )),
        ],
    }
}

pub fn product_form() -> FormSpec {
    FormSpec {
        name: "product".to_string(),
        title: "Product Information".to_string(),
        fields: vec![
            Field::new("productName", "Product Name", FieldKind::Text)
                .required("Product name is required")
                .rule(Rule::MinLength(2, "Product name must be at least 2 characters".to_string()))
                .rule(Rule::MaxLength(100, "Product name must be at most 100 characters".to_string())),
            Field::new("category", "Category", FieldKind::Select)
                .required("Please choose a category")
                .options(&[
                    ("electronics", "Electronics"),
                    ("clothing", "Clothing"),
                    ("books", "Books"),
                    ("food", "Food"),
                ]),
            Field::new("price", "Price", FieldKind::Number)
                .required("Price is required")
                .rule(Rule::Min(0.0, "Price must be 0 or more".to_string())),
            Field::new("description", "Description", FieldKind::Textarea)
                .rule(Rule::MaxLength(1000, "Description must be at most 1000 characters".to_string())),
            Field::new("inStock", "In Stock", FieldKind::Checkbox).default_value(true),
            Field::new("imageUrl", "Image URL", FieldKind::Url).rule(Rule::url()),
            Field::new("weight", "Weight (kg)", FieldKind::Number)
                .rule(Rule::Min(0.0, "Weight must be 0 kg or more".to_string())),
            Field::new("test", "Test", FieldKind::Select)
                .required("Please choose a test value")
                .options(&[("", "Choose"), ("1", "1"), ("2", "2")]),
        ],
    }
}

pub fn search_form() -> FormSpec {
    FormSpec {
        name: "search".to_string(),
        title: "Search".to_string(),
        fields: vec![
            Field::new("gender", "Gender", FieldKind::Select)
                .required("Please choose a gender")
                .options(&[("male", "Male"), ("female", "Female")]),
            Field::new("searchText", "Search Text", FieldKind::Text)
                .required("Search text is required")
                .rule(Rule::MinLength(1, "Search text must be at least 1 character".to_string()))
                .rule(Rule::MaxLength(20, "Search text must be at most 20 characters".to_string())),
        ],
    }
}

/// The plain contact form, validated without per-tab state.
pub fn contact_form() -> FormSpec {
    FormSpec {
        name: "contact".to_string(),
        title: "Contact".to_string(),
        fields: vec![
            Field::new("name", "Name", FieldKind::Text)
                .required("Name is required")
                .rule(Rule::MinLength(2, "Name must be at least 2 characters".to_string())),
            Field::new("email", "Email", FieldKind::Email)
                .required("Email is required")
                .rule(Rule::email()),
            Field::new("age", "Age", FieldKind::Number)
                .required("Age is required")
                .rule(Rule::Min(1.0, "Age must be at least 1".to_string()))
                .rule(Rule::Max(120.0, "Age must be at most 120".to_string())),
            Field::new("message", "Message", FieldKind::Textarea)
                .rule(Rule::MaxLength(500, "Message must be at most 500 characters".to_string())),
        ],
    }
}

/// Look up a built-in form by name.
pub fn builtin(name: &str) -> Option<FormSpec> {
    match name {
        "user" => Some(user_form()),
        "product" => Some(product_form()),
        "search" => Some(search_form()),
        "contact" => Some(contact_form()),
        _ => None,
    }
}
