//! Turning XML names into Rust identifiers.

use std::collections::BTreeSet;

use check_keyword::CheckKeyword;
use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::Span;
use syn::Ident;

/// Type names that would shadow prelude items used by generated code.
const RESERVED_TYPE_NAMES: &[&str] = &["Box", "Client", "Option", "Result", "Self", "String", "Vec"];

pub fn name_to_ident(name: &str) -> Ident {
    if ["crate", "self", "super", "Self"].contains(&name) {
        // These are keywords that are not allowed as raw identifiers
        Ident::new(&format!("{}_", name), Span::call_site())
    } else if name.is_keyword() {
        Ident::new_raw(name, Span::call_site())
    } else {
        Ident::new(name, Span::call_site())
    }
}

fn sanitize(name: &str) -> String {
    name.replace(|c: char| !c.is_ascii_alphanumeric(), "_")
}

fn prefix_digit(name: String) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// snake_case form of `name`, or `None` if nothing identifier-like remains.
pub fn snake_name(name: &str) -> Option<String> {
    let snake = sanitize(name).to_snake_case();
    (!snake.is_empty()).then(|| prefix_digit(snake))
}

/// PascalCase form of `name`, or `None` if nothing identifier-like remains.
pub fn pascal_name(name: &str) -> Option<String> {
    let pascal = sanitize(name).to_pascal_case();
    if pascal.is_empty() {
        return None;
    }
    let pascal = prefix_digit(pascal);
    Some(if RESERVED_TYPE_NAMES.contains(&pascal.as_str()) {
        format!("{pascal}Type")
    } else {
        pascal
    })
}

pub fn shouty_name(name: &str) -> Option<String> {
    let shouty = sanitize(name).to_shouty_snake_case();
    (!shouty.is_empty()).then(|| prefix_digit(shouty))
}

pub fn string_variant_to_ident(variant: &str) -> Ident {
    match pascal_name(variant) {
        None => Ident::new("Empty", Span::call_site()),
        Some(name) => name_to_ident(&name),
    }
}

/// Hands out names that are unique within one scope.
#[derive(Clone, Debug, Default)]
pub struct NameSet {
    taken: BTreeSet<String>,
}

impl NameSet {
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Returns `name`, or `name` followed by the first free numeric suffix (`separator` between
    /// the two), and takes it.
    pub fn unique(&mut self, name: &str, separator: &str) -> String {
        let mut candidate = name.to_string();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{name}{separator}{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(snake_name("GetWeatherByZip").as_deref(), Some("get_weather_by_zip"));
        assert_eq!(snake_name("return").as_deref(), Some("return"));
        assert_eq!(name_to_ident("return").to_string(), "r#return");
        assert_eq!(name_to_ident("self").to_string(), "self_");
        assert_eq!(snake_name("1st-place").as_deref(), Some("_1st_place"));
        assert_eq!(snake_name("--"), None);

        assert_eq!(pascal_name("chem_spell").as_deref(), Some("ChemSpell"));
        assert_eq!(pascal_name("string").as_deref(), Some("StringType"));
        assert_eq!(shouty_name("SpellPort").as_deref(), Some("SPELL_PORT"));
        assert_eq!(string_variant_to_ident("").to_string(), "Empty");
        assert_eq!(string_variant_to_ident("1.0").to_string(), "_10");
    }

    #[test]
    fn unique_names() {
        let mut names = NameSet::default();
        assert_eq!(names.unique("value", "_"), "value");
        assert_eq!(names.unique("value", "_"), "value_2");
        assert_eq!(names.unique("value", "_"), "value_3");
        names.reserve("Foo");
        assert_eq!(names.unique("Foo", ""), "Foo2");
    }
}
