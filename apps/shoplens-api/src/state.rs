use std::sync::Arc;

use shoplens_service::ShopLensService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ShopLensService>,
}
impl AppState {
	/// Connects the production providers. Must be called inside a tokio runtime.
	pub fn new(config: shoplens_config::Config) -> color_eyre::Result<Self> {
		let service = ShopLensService::new(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: ShopLensService) -> Self {
		Self { service: Arc::new(service) }
	}
}
