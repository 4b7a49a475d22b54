//! Query intent classification.
//!
//! A raw query is reduced to normalized text, facet filters (brand, type, status), and at most
//! one token that looks like a serial number or asset tag. Facet extraction is driven by an
//! ordered rule table; the first pattern of a rule that matches wins, and its capture is
//! canonicalized through that facet's alias table.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const IDENTIFIER_MIN_LEN: usize = 8;
const IDENTIFIER_MAX_LEN: usize = 20;
const IDENTIFIER_MIN_DIGITS: usize = 3;
const IDENTIFIER_PREFIXES: [&str; 2] = ["serial:", "serie:"];

const BRAND_ALIASES: &[(&str, &str)] = &[
	("apple", "Apple"),
	("hp", "HP"),
	("hewlett", "HP"),
	("dell", "Dell"),
	("lenovo", "Lenovo"),
	("asus", "ASUS"),
	("acer", "Acer"),
];
const TYPE_ALIASES: &[(&str, &str)] = &[
	("laptop", "Computadora"),
	("notebook", "Computadora"),
	("pc", "Computadora"),
	("computadora", "Computadora"),
	("desktop", "Computadora"),
];
const STATUS_ALIASES: &[(&str, &str)] =
	&[("alta", "ALTA"), ("baja", "BAJA"), ("mantenimiento", "MANTENIMIENTO")];

const RULES: [FacetRule; 3] = [
	FacetRule {
		facet: Facet::Brand,
		patterns: &[r"(?i)\bmarca\s+([a-záéíóúüñ0-9\-]+)", r"(?i)\bbrand:(\S+)"],
		canonicalize: canonical_brand,
	},
	FacetRule {
		facet: Facet::Status,
		patterns: &[r"(?i)\bstatus\s+([a-záéíóúüñ]+)", r"(?i)\bstatus:(\S+)"],
		canonicalize: canonical_status,
	},
	FacetRule {
		facet: Facet::Type,
		patterns: &[r"(?i)\b(laptop|notebook|desktop|computadora|pc)\b", r"(?i)\btype:(\S+)"],
		canonicalize: canonical_type,
	},
];

static COMPILED_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
	RULES
		.iter()
		.map(|rule| CompiledRule {
			facet: rule.facet,
			patterns: rule.patterns.iter().filter_map(|pattern| Regex::new(pattern).ok()).collect(),
			canonicalize: rule.canonicalize,
		})
		.collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
	Brand,
	Type,
	Status,
}
impl Facet {
	/// Key used for this facet in vector-store payloads and serialized filters.
	pub fn payload_key(self) -> &'static str {
		match self {
			Self::Brand => "brandName",
			Self::Type => "typeName",
			Self::Status => "status",
		}
	}
}

/// Canonical facet values; absent facets are omitted rather than null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub brand_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub type_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
}
impl Filters {
	pub fn get(&self, facet: Facet) -> Option<&str> {
		match facet {
			Facet::Brand => self.brand_name.as_deref(),
			Facet::Type => self.type_name.as_deref(),
			Facet::Status => self.status.as_deref(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.iter().next().is_none()
	}

	/// Present facets in a fixed order: brand, type, status.
	pub fn iter(&self) -> impl Iterator<Item = (Facet, &str)> {
		[Facet::Brand, Facet::Type, Facet::Status]
			.into_iter()
			.filter_map(|facet| self.get(facet).map(|value| (facet, value)))
	}

	fn set(&mut self, facet: Facet, value: String) {
		let slot = match facet {
			Facet::Brand => &mut self.brand_name,
			Facet::Type => &mut self.type_name,
			Facet::Status => &mut self.status,
		};

		*slot = Some(value);
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
	pub normalized_text: String,
	pub filters: Filters,
	pub candidate_identifier: Option<String>,
}

struct FacetRule {
	facet: Facet,
	patterns: &'static [&'static str],
	canonicalize: fn(&str) -> String,
}

struct CompiledRule {
	facet: Facet,
	patterns: Vec<Regex>,
	canonicalize: fn(&str) -> String,
}

pub fn classify(raw: &str) -> ParsedQuery {
	let normalized_text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
	let mut filters = Filters::default();

	for rule in COMPILED_RULES.iter() {
		let captured = rule.patterns.iter().find_map(|pattern| {
			pattern.captures(&normalized_text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
		});

		if let Some(raw_value) = captured {
			filters.set(rule.facet, (rule.canonicalize)(raw_value));
		}
	}

	let candidate_identifier = normalized_text
		.split_whitespace()
		.map(strip_identifier_prefix)
		.find(|token| looks_like_identifier(token))
		.map(str::to_string);

	ParsedQuery { normalized_text, filters, candidate_identifier }
}

/// Serial/asset-tag heuristic: 8-20 characters of ASCII letters, digits, and hyphens, with at
/// least three digits and one letter.
pub fn looks_like_identifier(token: &str) -> bool {
	let token = token.trim();
	let len = token.chars().count();

	if !(IDENTIFIER_MIN_LEN..=IDENTIFIER_MAX_LEN).contains(&len) {
		return false;
	}
	if !token.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
		return false;
	}

	let digits = token.chars().filter(char::is_ascii_digit).count();

	digits >= IDENTIFIER_MIN_DIGITS && token.chars().any(|ch| ch.is_ascii_alphabetic())
}

pub fn canonical_brand(raw: &str) -> String {
	lookup_alias(BRAND_ALIASES, raw).unwrap_or_else(|| raw.to_string())
}

pub fn canonical_type(raw: &str) -> String {
	lookup_alias(TYPE_ALIASES, raw).unwrap_or_else(|| raw.to_string())
}

pub fn canonical_status(raw: &str) -> String {
	lookup_alias(STATUS_ALIASES, raw).unwrap_or_else(|| raw.to_uppercase())
}

fn lookup_alias(table: &[(&str, &str)], raw: &str) -> Option<String> {
	let key = raw.to_lowercase();

	table.iter().find(|(alias, _)| *alias == key).map(|(_, canonical)| canonical.to_string())
}

fn strip_identifier_prefix(token: &str) -> &str {
	for prefix in IDENTIFIER_PREFIXES {
		if token.len() >= prefix.len()
			&& token.is_char_boundary(prefix.len())
			&& token[..prefix.len()].eq_ignore_ascii_case(prefix)
		{
			return &token[prefix.len()..];
		}
	}

	token
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_rule_pattern_compiles() {
		for (rule, compiled) in RULES.iter().zip(COMPILED_RULES.iter()) {
			assert_eq!(rule.patterns.len(), compiled.patterns.len(), "{:?}", rule.facet);
		}
	}

	#[test]
	fn identifier_heuristic_bounds() {
		assert!(looks_like_identifier("ABC123456"));
		assert!(looks_like_identifier("5CG-1234-XY"));
		assert!(looks_like_identifier("A1B2C3D4"));
		assert!(!looks_like_identifier("AB12345"));
		assert!(!looks_like_identifier("12345678"));
		assert!(!looks_like_identifier("ABCDEFGH"));
		assert!(!looks_like_identifier("ABC_123456"));
		assert!(!looks_like_identifier("ABCDEFGHIJ1234567890X"));
	}

	#[test]
	fn strips_prefix_case_insensitively() {
		assert_eq!(strip_identifier_prefix("SERIAL:ABC123456"), "ABC123456");
		assert_eq!(strip_identifier_prefix("serie:XYZ98765"), "XYZ98765");
		assert_eq!(strip_identifier_prefix("ñserial"), "ñserial");
		assert_eq!(strip_identifier_prefix("abc"), "abc");
	}

	#[test]
	fn unknown_status_is_upper_cased() {
		assert_eq!(canonical_status("Prestamo"), "PRESTAMO");
		assert_eq!(canonical_status("Baja"), "BAJA");
	}

	#[test]
	fn unknown_brand_keeps_original_casing() {
		assert_eq!(canonical_brand("Toshiba"), "Toshiba");
		assert_eq!(canonical_brand("HEWLETT"), "HP");
	}
}
