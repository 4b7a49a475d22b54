const INIT_SQL: &str = include_str!("../../../sql/init.sql");

/// Schema statements in file order, split on `;`.
pub fn statements() -> impl Iterator<Item = &'static str> {
	INIT_SQL.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_creates_catalog_relation_first() {
		let statements = statements().collect::<Vec<_>>();

		assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS inventory_assets"));
		assert!(statements.iter().all(|statement| statement.contains("IF NOT EXISTS")));
	}
}
