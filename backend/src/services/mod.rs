//! Advisory services for the Agricultural Advisory Platform

use shared::{CropContext, FarmContext};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{CropRepository, FarmRepository};

pub mod advisory;
pub mod disease;
pub mod fertilizer;
pub mod irrigation;

pub use disease::DiseaseAdvisor;
pub use fertilizer::FertilizerAdvisor;

/// Load a farm and one of its crops, or fail with `NotFound`
pub(crate) async fn load_farm_and_crop<S>(
    store: &S,
    farm_id: Uuid,
    crop_id: Uuid,
) -> AppResult<(FarmContext, CropContext)>
where
    S: FarmRepository + CropRepository,
{
    let farm = load_farm(store, farm_id).await?;
    let crop = store
        .get_crop(farm_id, crop_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop".to_string()))?;
    Ok((farm, crop))
}

/// Load a farm, or fail with `NotFound`
pub(crate) async fn load_farm<S>(store: &S, farm_id: Uuid) -> AppResult<FarmContext>
where
    S: FarmRepository,
{
    store
        .get_farm(farm_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Farm".to_string()))
}
