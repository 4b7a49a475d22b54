//! Catalog reads over `inventory_assets`. Only enabled assets are visible.

use sqlx::{Postgres, QueryBuilder};

use inq_domain::{
	AssetId,
	identifier::IdentifierRecord,
	query_intent::{Facet, Filters},
};

use crate::{
	Result,
	db::Db,
	models::{AssetRow, IdentifierRow, ModelRow},
};

const ASSET_COLUMNS: &str = "\
id, serial_number, active_number, status, comments, internal_folio, reception_date, alta_date, \
baja_date, created_at, model_name, brand_name, type_name, invoice_code, purchase_order_code, \
custom_fields_text";
const KEYWORD_COLUMNS: [&str; 10] = [
	"model_name",
	"brand_name",
	"type_name",
	"serial_number",
	"active_number",
	"comments",
	"internal_folio",
	"invoice_code",
	"purchase_order_code",
	"custom_fields_text",
];

/// Every non-empty serial number and asset tag, one record per field.
pub async fn identifier_snapshot(db: &Db) -> Result<Vec<IdentifierRecord>> {
	let rows = sqlx::query_as::<_, IdentifierRow>(
		"\
SELECT id, serial_number, active_number
FROM inventory_assets
WHERE enabled
	AND (serial_number IS NOT NULL OR active_number IS NOT NULL)
ORDER BY id",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().flat_map(identifier_records).collect())
}

/// Exact match on serial number or asset tag.
pub async fn find_by_identifier(db: &Db, identifier: &str) -> Result<Option<AssetRow>> {
	let sql = format!(
		"SELECT {ASSET_COLUMNS} FROM inventory_assets \
		 WHERE enabled AND (serial_number = $1 OR active_number = $1) ORDER BY id LIMIT 1"
	);
	let row = sqlx::query_as::<_, AssetRow>(&sql).bind(identifier).fetch_optional(&db.pool).await?;

	Ok(row)
}

/// Case-insensitive substring search across descriptive columns, narrowed by facet equality.
pub async fn keyword_search(
	db: &Db,
	text: &str,
	filters: &Filters,
	limit: u32,
) -> Result<Vec<AssetRow>> {
	if limit == 0 {
		return Ok(Vec::new());
	}

	let pattern = like_pattern(text);
	let mut builder = QueryBuilder::<Postgres>::new(format!(
		"SELECT {ASSET_COLUMNS} FROM inventory_assets WHERE enabled AND ("
	));
	let mut separated = builder.separated(" OR ");

	for column in KEYWORD_COLUMNS {
		separated.push(format!("{column} ILIKE "));
		separated.push_bind_unseparated(pattern.clone());
	}

	builder.push(")");

	for (facet, value) in filters.iter() {
		builder.push(format!(" AND {} = ", facet_column(facet)));
		builder.push_bind(value.to_string());
	}

	builder.push(" ORDER BY id LIMIT ");
	builder.push_bind(i64::from(limit));

	let rows = builder.build_query_as::<AssetRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Rows for `ids`, in no particular order; missing or disabled ids are skipped.
pub async fn fetch_by_ids(db: &Db, ids: &[AssetId]) -> Result<Vec<AssetRow>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"SELECT {ASSET_COLUMNS} FROM inventory_assets WHERE enabled AND id = ANY($1::bigint[])"
	);
	let rows = sqlx::query_as::<_, AssetRow>(&sql).bind(ids.to_vec()).fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn fetch_model(db: &Db, id: AssetId) -> Result<Option<ModelRow>> {
	let row = sqlx::query_as::<_, ModelRow>(
		"\
SELECT id, model_name, brand_name, type_name
FROM inventory_assets
WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

fn identifier_records(row: IdentifierRow) -> impl Iterator<Item = IdentifierRecord> {
	let id = row.id;

	[row.serial_number, row.active_number]
		.into_iter()
		.flatten()
		.filter(|identifier| !identifier.trim().is_empty())
		.map(move |identifier| IdentifierRecord { asset_id: id, identifier })
}

fn facet_column(facet: Facet) -> &'static str {
	match facet {
		Facet::Brand => "brand_name",
		Facet::Type => "type_name",
		Facet::Status => "status",
	}
}

// Postgres treats backslash as the default LIKE escape.
fn like_pattern(text: &str) -> String {
	let mut pattern = String::with_capacity(text.len() + 2);

	pattern.push('%');

	for ch in text.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			pattern.push('\\');
		}

		pattern.push(ch);
	}

	pattern.push('%');

	pattern
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn like_pattern_escapes_wildcards() {
		assert_eq!(like_pattern("hp"), "%hp%");
		assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
	}

	#[test]
	fn identifier_records_skip_blank_fields() {
		let row = IdentifierRow {
			id: 9,
			serial_number: Some("5CG1234XYZ".to_string()),
			active_number: Some("  ".to_string()),
		};
		let records = identifier_records(row).collect::<Vec<_>>();

		assert_eq!(records, vec![IdentifierRecord {
			asset_id: 9,
			identifier: "5CG1234XYZ".to_string(),
		}]);
	}

	#[test]
	fn both_identifier_fields_are_indexed() {
		let row = IdentifierRow {
			id: 4,
			serial_number: Some("SN0001234".to_string()),
			active_number: Some("AT-000045".to_string()),
		};

		assert_eq!(identifier_records(row).count(), 2);
	}
}
