//! Form values and declarative validation rules

use regex::Regex;
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{collections::HashMap, sync::OnceLock};

/// Loose email shape check: something, an `@`, a domain and a TLD
pub fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    })
}

/// A single constraint on submitted form values
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Every listed field is present and not blank after trimming
    Required(&'static [&'static str]),
    /// At most `n` characters
    MaxLength(&'static str, usize),
    /// At least `n` characters
    MinLength(&'static str, usize),
    /// Exactly one of the listed literals
    PermittedValues(&'static str, &'static [&'static str]),
    /// Matches the pattern
    MatchesPattern(&'static str, &'static Regex),
}

/// Field-keyed validation messages
#[derive(Debug, Clone, Default)]
pub struct FormErrors(HashMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// First message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in self.0.keys() {
            map.serialize_entry(field, &self.get(field))?;
        }
        map.end()
    }
}

/// Submitted values for one request plus the errors found in them
#[derive(Debug, Clone, Default)]
pub struct Form {
    values: HashMap<String, Vec<String>>,
    pub errors: FormErrors,
}

impl Form {
    /// Build a form from decoded `application/x-www-form-urlencoded` pairs
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (field, value) in pairs {
            values.entry(field).or_default().push(value);
        }
        Self {
            values,
            errors: FormErrors::default(),
        }
    }

    /// First submitted value for `field`, or `""`
    pub fn get(&self, field: &str) -> &str {
        self.values
            .get(field)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), vec![value.into()]);
    }

    /// Apply every rule in order, accumulating errors
    pub fn validate(&mut self, rules: &[Rule]) {
        for rule in rules {
            self.apply(rule);
        }
    }

    /// Record `message` under `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.errors.add(field, message);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn apply(&mut self, rule: &Rule) {
        match *rule {
            Rule::Required(fields) => {
                for field in fields {
                    if self.get(field).trim().is_empty() {
                        self.errors.add(field, format!("{field} cannot be blank"));
                    }
                }
            }
            Rule::MaxLength(field, max) => {
                let value = self.get(field);
                if !value.is_empty() && value.chars().count() > max {
                    self.errors.add(
                        field,
                        format!("{field} is too long (maximum is {max} characters)"),
                    );
                }
            }
            Rule::MinLength(field, min) => {
                let value = self.get(field);
                if !value.is_empty() && value.chars().count() < min {
                    self.errors.add(
                        field,
                        format!("{field} is too short (minimum is {min} characters)"),
                    );
                }
            }
            Rule::PermittedValues(field, allowed) => {
                let value = self.get(field);
                if !value.is_empty() && !allowed.contains(&value) {
                    self.errors.add(field, format!("{field} is invalid"));
                }
            }
            Rule::MatchesPattern(field, pattern) => {
                let value = self.get(field);
                if !value.is_empty() && !pattern.is_match(value) {
                    self.errors.add(field, format!("{field} is invalid"));
                }
            }
        }
    }
}

impl Serialize for Form {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values: HashMap<&str, &str> = self
            .values
            .keys()
            .map(|field| (field.as_str(), self.get(field)))
            .collect();

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("values", &values)?;
        map.serialize_entry("errors", &self.errors)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_required_rejects_missing_empty_and_whitespace() {
        let mut f = form(&[("title", ""), ("content", " \t\n ")]);
        f.validate(&[Rule::Required(&["title", "content", "expires"])]);

        assert!(!f.is_valid());
        assert_eq!(f.errors.get("title"), Some("title cannot be blank"));
        assert_eq!(f.errors.get("content"), Some("content cannot be blank"));
        assert_eq!(f.errors.get("expires"), Some("expires cannot be blank"));
    }

    #[test]
    fn test_length_rules_are_boundary_inclusive() {
        let at_limit = "é".repeat(100);
        let mut f = form(&[("title", at_limit.as_str()), ("password", "0123456789")]);
        f.validate(&[Rule::MaxLength("title", 100), Rule::MinLength("password", 10)]);
        assert!(f.is_valid());

        let over_limit = "é".repeat(101);
        let mut f = form(&[("title", over_limit.as_str()), ("password", "012345678")]);
        f.validate(&[Rule::MaxLength("title", 100), Rule::MinLength("password", 10)]);
        assert_eq!(
            f.errors.get("title"),
            Some("title is too long (maximum is 100 characters)")
        );
        assert_eq!(
            f.errors.get("password"),
            Some("password is too short (minimum is 10 characters)")
        );
    }

    #[test]
    fn test_permitted_values_is_exact_and_case_sensitive() {
        let rules = [Rule::PermittedValues("expires", &["365", "7", "1"])];

        let mut f = form(&[("expires", "7")]);
        f.validate(&rules);
        assert!(f.is_valid());

        for bad in ["30", " 7", "07"] {
            let mut f = form(&[("expires", bad)]);
            f.validate(&rules);
            assert_eq!(f.errors.get("expires"), Some("expires is invalid"), "{bad:?}");
        }

        let mut f = form(&[("colour", "Red")]);
        f.validate(&[Rule::PermittedValues("colour", &["red"])]);
        assert!(!f.is_valid());
    }

    #[test]
    fn test_email_pattern() {
        let rules = [Rule::MatchesPattern("email", email_regex())];

        let mut f = form(&[("email", "a@b.com")]);
        f.validate(&rules);
        assert!(f.is_valid());

        for bad in ["a@b", "a.b.com", "a@@b.com", "@b.com"] {
            let mut f = form(&[("email", bad)]);
            f.validate(&rules);
            assert!(!f.is_valid(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_rules_accumulate_in_order() {
        let long_title = "x".repeat(120);
        let mut f = form(&[("title", long_title.as_str()), ("expires", "2")]);
        f.validate(&[
            Rule::Required(&["title", "content", "expires"]),
            Rule::MaxLength("title", 100),
            Rule::PermittedValues("expires", &["365", "7", "1"]),
        ]);

        assert!(f.errors.get("title").is_some());
        assert!(f.errors.get("content").is_some());
        assert!(f.errors.get("expires").is_some());
    }

    #[test]
    fn test_cross_field_check() {
        let mut f = form(&[("newPassword", "abcdefghij"), ("newPasswordConfirmation", "x")]);
        let matches = f.get("newPassword") == f.get("newPasswordConfirmation");
        f.check(matches, "newPasswordConfirmation", "Passwords do not match");

        assert_eq!(
            f.errors.get("newPasswordConfirmation"),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn test_first_value_wins_and_serializes_flat() {
        let mut f = form(&[("title", "first"), ("title", "second")]);
        f.errors.add("title", "one");
        f.errors.add("title", "two");

        assert_eq!(f.get("title"), "first");
        assert_eq!(f.get("missing"), "");

        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["values"]["title"], "first");
        assert_eq!(json["errors"]["title"], "one");
    }
}
