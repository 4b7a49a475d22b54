use serde_json::json;

use inq_domain::{
	fusion::{self, Candidate, Provenance},
	identifier::{self, IdentifierIndex, IdentifierRecord, MatchReason},
	query_intent::{self, Facet},
};

fn record(asset_id: i64, identifier: &str) -> IdentifierRecord {
	IdentifierRecord { asset_id, identifier: identifier.to_string() }
}

fn candidate(id: &str, provenance: Provenance) -> Candidate {
	Candidate { id: id.to_string(), score: 1.0, provenance, payload: json!({ "id": id }) }
}

#[test]
fn classifies_brand_type_status_and_identifier() {
	let parsed = query_intent::classify("marca HP laptop status alta SN ABC123456");

	assert_eq!(parsed.filters.get(Facet::Brand), Some("HP"));
	assert_eq!(parsed.filters.get(Facet::Type), Some("Computadora"));
	assert_eq!(parsed.filters.get(Facet::Status), Some("ALTA"));
	assert_eq!(parsed.candidate_identifier.as_deref(), Some("ABC123456"));
	assert_eq!(
		serde_json::to_value(&parsed.filters).expect("Failed to serialize filters."),
		json!({ "brandName": "HP", "typeName": "Computadora", "status": "ALTA" })
	);
}

#[test]
fn classifier_collapses_whitespace_and_omits_absent_facets() {
	let parsed = query_intent::classify("  monitor   para   oficina ");

	assert_eq!(parsed.normalized_text, "monitor para oficina");
	assert!(parsed.filters.is_empty());
	assert!(parsed.candidate_identifier.is_none());
	assert_eq!(serde_json::to_value(&parsed.filters).expect("Failed to serialize."), json!({}));
}

#[test]
fn classifier_accepts_key_value_facets_and_serial_prefix() {
	let parsed =
		query_intent::classify("brand:hewlett type:Servidor status:prestamo serie:5CG1234XYZ");

	assert_eq!(parsed.filters.brand_name.as_deref(), Some("HP"));
	assert_eq!(parsed.filters.type_name.as_deref(), Some("Servidor"));
	assert_eq!(parsed.filters.status.as_deref(), Some("PRESTAMO"));
	assert_eq!(parsed.candidate_identifier.as_deref(), Some("5CG1234XYZ"));
}

#[test]
fn first_identifier_like_token_wins() {
	let parsed = query_intent::classify("buscar XYZ98765A o ABC123456");

	assert_eq!(parsed.candidate_identifier.as_deref(), Some("XYZ98765A"));
}

#[test]
fn fuzzy_lookup_finds_one_insertion_away() {
	assert_eq!(identifier::normalize("AB-1234"), identifier::normalize("ab1234"));

	let index = IdentifierIndex::build([record(1, "AB12345"), record(2, "ZZ999999")]);
	let hits = index.lookup("AB1234", 2, 8);

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].asset_id, 1);
	assert_eq!(hits[0].distance, 1);
	assert_eq!(hits[0].reason, MatchReason::Levenshtein);
}

#[test]
fn fuzzy_lookup_orders_by_distance_and_truncates() {
	let index = IdentifierIndex::build([
		record(1, "SN-0000-12"),
		record(2, "SN000013"),
		record(3, "SN00001234"),
		record(4, "SN000012"),
	]);
	let hits = index.lookup("SN000012", 2, 3);
	let distances = hits.iter().map(|hit| hit.distance).collect::<Vec<_>>();

	assert_eq!(hits.len(), 3);
	assert_eq!(distances, vec![0, 0, 1]);
	assert_eq!(hits[0].original, "SN-0000-12");
	assert_eq!(hits[1].original, "SN000012");
	assert_eq!(hits[2].asset_id, 2);
}

#[test]
fn fusion_is_deterministic() {
	let lists = vec![
		vec![
			candidate("a", Provenance::Semantic),
			candidate("b", Provenance::Semantic),
			candidate("c", Provenance::Semantic),
		],
		vec![
			candidate("c", Provenance::Keyword),
			candidate("d", Provenance::Keyword),
			candidate("a", Provenance::Keyword),
		],
	];
	let first = fusion::fuse(&lists, fusion::DEFAULT_RRF_K);
	let second = fusion::fuse(&lists, fusion::DEFAULT_RRF_K);

	assert_eq!(first, second);
	assert_eq!(first.len(), 4);
	assert_eq!(first[0].id, "a");
	assert_eq!(first[1].id, "c");
}
