//! HTTP handlers for `/service/v1/volumes`

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use volume_common::{CreateVolumeRequest, ResourceKind, VolumeQuery};

use super::pipeline::VolumePipeline;
use crate::error::{ApiError, PrettyJson};
use crate::kubernetes::ResourceState;
use crate::state::AppState;

async fn create(
    state: &AppState,
    kind: ResourceKind,
    payload: Result<Json<CreateVolumeRequest>, JsonRejection>,
) -> Result<PrettyJson<ResourceState>, ApiError> {
    let Json(payload) = payload?;
    let created = VolumePipeline::from_state(state).create(kind, payload).await?;
    Ok(PrettyJson(created))
}

async fn read(
    state: &AppState,
    kind: ResourceKind,
    query: Result<Query<VolumeQuery>, QueryRejection>,
) -> Result<PrettyJson<ResourceState>, ApiError> {
    let Query(query) = query?;
    let status = VolumePipeline::from_state(state).read(kind, query).await?;
    Ok(PrettyJson(status))
}

async fn delete(
    state: &AppState,
    kind: ResourceKind,
    query: Result<Query<VolumeQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(query) = query?;
    VolumePipeline::from_state(state).delete(kind, query).await?;
    Ok(StatusCode::OK)
}

pub async fn create_pv(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateVolumeRequest>, JsonRejection>,
) -> Result<PrettyJson<ResourceState>, ApiError> {
    create(&state, ResourceKind::Pv, payload).await
}

pub async fn get_pv(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VolumeQuery>, QueryRejection>,
) -> Result<PrettyJson<ResourceState>, ApiError> {
    read(&state, ResourceKind::Pv, query).await
}

pub async fn delete_pv(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VolumeQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    delete(&state, ResourceKind::Pv, query).await
}

pub async fn create_pvc(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateVolumeRequest>, JsonRejection>,
) -> Result<PrettyJson<ResourceState>, ApiError> {
    create(&state, ResourceKind::Pvc, payload).await
}

pub async fn get_pvc(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VolumeQuery>, QueryRejection>,
) -> Result<PrettyJson<ResourceState>, ApiError> {
    read(&state, ResourceKind::Pvc, query).await
}

pub async fn delete_pvc(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VolumeQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    delete(&state, ResourceKind::Pvc, query).await
}
