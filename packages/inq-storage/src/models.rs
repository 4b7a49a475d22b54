use time::OffsetDateTime;

/// One catalog asset with its model, brand, and type names resolved.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssetRow {
	pub id: i64,
	pub serial_number: Option<String>,
	pub active_number: Option<String>,
	pub status: Option<String>,
	pub comments: Option<String>,
	pub internal_folio: Option<String>,
	pub reception_date: Option<OffsetDateTime>,
	pub alta_date: Option<OffsetDateTime>,
	pub baja_date: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub model_name: String,
	pub brand_name: String,
	pub type_name: String,
	pub invoice_code: Option<String>,
	pub purchase_order_code: Option<String>,
	pub custom_fields_text: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct IdentifierRow {
	pub id: i64,
	pub serial_number: Option<String>,
	pub active_number: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModelRow {
	pub id: i64,
	pub model_name: String,
	pub brand_name: String,
	pub type_name: String,
}
