use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedImages {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteImagesRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedImages {
    pub deleted: usize,
}
