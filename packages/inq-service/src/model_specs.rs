use serde::{Deserialize, Serialize};

use inq_domain::AssetId;

use crate::{Error, InqService, ModelRecord, Result, bounded_catalog};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpecsRequest {
	pub id: AssetId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpecsResponse {
	pub id: AssetId,
	pub brand: String,
	pub model: String,
	#[serde(rename = "type")]
	pub type_name: String,
	/// Approximate spec sheet written by the language model, not catalog data.
	pub specs: String,
}

impl InqService {
	pub async fn model_specs(&self, req: ModelSpecsRequest) -> Result<ModelSpecsResponse> {
		let model =
			bounded_catalog(self.catalog_timeout(), self.stores.catalog.fetch_model(req.id)).await?;
		let Some(model) = model else {
			return Err(Error::NotFound { message: format!("Asset {} does not exist.", req.id) });
		};
		let prompt = build_prompt(&model);
		let specs = self.providers.generation.generate(&self.cfg.providers.llm, &prompt).await?;

		Ok(ModelSpecsResponse {
			id: model.id,
			brand: model.brand_name,
			model: model.model_name,
			type_name: model.type_name,
			specs,
		})
	}
}

fn build_prompt(model: &ModelRecord) -> String {
	format!(
		"Act as a hardware expert. Using general knowledge only, without browsing:\n\
		 Model: {} {} ({})\n\
		 Give a short, probable spec sheet: CPU and RAM options, ports, storage, approximate \
		 release year, and typical uses.\n\
		 State that details vary by configuration and batch. Answer in Spanish as bullet points.",
		model.brand_name, model.model_name, model.type_name
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prompt_names_the_model() {
		let model = ModelRecord {
			id: 3,
			model_name: "ThinkPad T14".to_string(),
			brand_name: "Lenovo".to_string(),
			type_name: "Computadora".to_string(),
		};
		let prompt = build_prompt(&model);

		assert!(prompt.contains("Model: Lenovo ThinkPad T14 (Computadora)"));
		assert!(prompt.contains("vary by configuration"));
	}
}
