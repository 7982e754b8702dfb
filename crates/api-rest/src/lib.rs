//! # API REST
//!
//! REST API implementation for the partogram labor timer.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Timer state is computed by `partogram-core` on every query; this crate
//! only translates between HTTP and the core services.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    AdmitPatientReq, CompleteLaborRes, ErrorRes, HealthRes, HealthService, MeasurementsRes,
    PatientRes, PatientsRes, RecordMeasurementReq, RecordMeasurementRes, ServerTimeRes,
    TimerStateRes, TimerStatesRes, UpdatePatientReq,
};
use partogram_core::{
    Clock, LaborService, LaborStatus, MeasurementId, NewMeasurement, NewPatient, PartogramError,
    PartogramResult, PatientFilter, PatientId, PatientUpdate, TimerQueryService,
};
use partogram_types::{BodyTemperature, CervicalDilation, FetalHeartRate, MaternalPulse, NonEmptyText};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub labor: LaborService,
    pub query: TimerQueryService,
    pub clock: Arc<dyn Clock>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        server_time,
        list_patients,
        admit_patient,
        update_patient,
        delete_patient,
        timer_state,
        timer_states_bulk,
        list_measurements,
        record_measurement,
        complete_labor,
        delete_measurement,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ServerTimeRes,
        api_shared::LaborStatus,
        api_shared::PatientRes,
        api_shared::PatientsRes,
        api_shared::PatientTimerEntry,
        api_shared::TimerStateRes,
        api_shared::TimerStatesRes,
        api_shared::AdmitPatientReq,
        api_shared::UpdatePatientReq,
        api_shared::RecordMeasurementReq,
        api_shared::RecordMeasurementRes,
        api_shared::CompleteLaborRes,
        api_shared::MeasurementRes,
        api_shared::MeasurementsRes,
        api_shared::ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with every endpoint, Swagger UI and CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/server_time", get(server_time))
        .route("/api/patients", get(list_patients))
        .route("/api/patients", post(admit_patient))
        .route("/api/patients/:id", put(update_patient))
        .route("/api/patients/:id", delete(delete_patient))
        .route("/api/patients/:id/timer_state", get(timer_state))
        .route("/api/timer_states", get(timer_states_bulk))
        .route("/api/patients/:id/measurements", get(list_measurements))
        .route("/api/patients/:id/measurements", post(record_measurement))
        .route("/api/patients/:id/complete_labor", post(complete_labor))
        .route(
            "/api/patients/:id/measurements/:measurement_id",
            delete(delete_measurement),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorRes>);

/// Maps core errors onto HTTP statuses: validation 422, missing records
/// 404, state machine violations 409, storage failures opaque 500.
fn error_response(error: PartogramError) -> ApiError {
    let status = match &error {
        PartogramError::Validation(_) | PartogramError::Value(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PartogramError::PatientNotFound(_) | PartogramError::MeasurementNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        PartogramError::InvalidTransition(_) => StatusCode::CONFLICT,
        _ => {
            tracing::error!("storage error: {error}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: "Internal error".into(),
                }),
            );
        }
    };
    (
        status,
        Json(ErrorRes {
            error: error.to_string(),
        }),
    )
}

fn parse_patient_id(raw: &str) -> Result<PatientId, ApiError> {
    PatientId::parse(raw).map_err(error_response)
}

/// Validates a measurement request into a domain draft. Range checks live
/// in `partogram-types`; anything out of range surfaces as a 422.
fn build_draft(
    req: RecordMeasurementReq,
    now: chrono::DateTime<chrono::Utc>,
) -> PartogramResult<NewMeasurement> {
    let mut draft = NewMeasurement::at(req.time.unwrap_or(now));
    draft.cervical_dilation = req
        .cervical_dilation
        .map(|cm| CervicalDilation::new(cm.into()))
        .transpose()?;
    draft.fetal_heart_rate = req
        .fetal_heart_rate
        .map(|bpm| FetalHeartRate::new(bpm.into()))
        .transpose()?;
    draft.maternal_pulse = req
        .maternal_pulse
        .map(|bpm| MaternalPulse::new(bpm.into()))
        .transpose()?;
    draft.temperature = req.temperature.map(BodyTemperature::new).transpose()?;
    draft.head_descent = req
        .head_descent
        .map(|station| {
            u8::try_from(station).map_err(|_| {
                PartogramError::Validation(format!("head descent cannot be negative: {station}"))
            })
        })
        .transpose()?;
    draft.contraction_frequency = req
        .contraction_frequency
        .map(|n| {
            u32::try_from(n).map_err(|_| {
                PartogramError::Validation(format!("contraction frequency cannot be negative: {n}"))
            })
        })
        .transpose()?;
    draft.contraction_duration = req
        .contraction_duration
        .map(|n| {
            u32::try_from(n).map_err(|_| {
                PartogramError::Validation(format!("contraction duration cannot be negative: {n}"))
            })
        })
        .transpose()?;
    draft.blood_pressure = req.blood_pressure;
    draft.decelerations = req.decelerations;
    draft.amniotic_fluid = req.amniotic_fluid;
    draft.presentation = req.presentation;
    draft.caput = req.caput;
    draft.molding = req.molding;
    draft.urination = req.urination;
    draft.pushing = req.pushing;
    draft.oxytocin = req.oxytocin;
    draft.medications = req.medications;
    draft.iv_fluids = req.iv_fluids;
    Ok(draft)
}

/// Query parameters for the patient list.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPatientsQuery {
    /// Case-insensitive substring of the patient's full name.
    pub search: Option<String>,
    /// `not_started`, `in_progress`, `completed` or `all`.
    pub status: Option<String>,
    /// Exact admission date filter.
    pub admission_date: Option<NaiveDate>,
}

fn parse_status_filter(raw: Option<&str>) -> PartogramResult<Option<LaborStatus>> {
    match raw {
        None | Some("") | Some("all") => Ok(None),
        Some("not_started") => Ok(Some(LaborStatus::NotStarted)),
        Some("in_progress") => Ok(Some(LaborStatus::InProgress)),
        Some("completed") => Ok(Some(LaborStatus::Completed)),
        Some(other) => Err(PartogramError::Validation(format!(
            "unknown status filter: {other}"
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, used by monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/server_time",
    responses(
        (status = 200, description = "Current server time as epoch seconds", body = ServerTimeRes)
    )
)]
/// Current server time.
///
/// Lets clients estimate their clock skew for display purposes. The timer
/// endpoints' `remaining_seconds` stays authoritative regardless.
#[axum::debug_handler]
async fn server_time(State(state): State<AppState>) -> Json<ServerTimeRes> {
    Json(ServerTimeRes {
        time: state.clock.now().timestamp(),
    })
}

#[utoipa::path(
    get,
    path = "/api/patients",
    params(ListPatientsQuery),
    responses(
        (status = 200, description = "Filtered patient list with timer summaries", body = PatientsRes),
        (status = 422, description = "Invalid filter", body = ErrorRes)
    )
)]
/// List patients, most recently admitted first.
///
/// Each row embeds the same timer summary as the bulk timer query so the
/// list view needs a single request.
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<ListPatientsQuery>,
) -> Result<Json<PatientsRes>, ApiError> {
    let filter = PatientFilter {
        search: params.search.filter(|s| !s.trim().is_empty()),
        status: parse_status_filter(params.status.as_deref()).map_err(error_response)?,
        admission_date: params.admission_date,
    };

    let views = state.query.patients(&filter).map_err(error_response)?;
    tracing::info!(count = views.len(), "patients listed");
    Ok(Json(PatientsRes {
        patients: views.iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = AdmitPatientReq,
    responses(
        (status = 201, description = "Patient admitted", body = PatientRes),
        (status = 422, description = "Invalid patient data", body = ErrorRes)
    )
)]
/// Admit a patient. Labor is not started until the first measurement.
#[axum::debug_handler]
async fn admit_patient(
    State(state): State<AppState>,
    Json(req): Json<AdmitPatientReq>,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let full_name = NonEmptyText::new(&req.full_name)
        .map_err(|e| error_response(PartogramError::Value(e)))?;

    let new_patient = NewPatient {
        full_name,
        admission_date: req.admission_date,
        history_number: req.history_number,
        parity: req.parity,
        age: req.age,
        gestational_age: req.gestational_age,
        membrane_rupture: req.membrane_rupture,
        risk_factors: req.risk_factors,
        notes: req.notes,
    };

    let patient = state
        .labor
        .admit_patient(new_patient)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json((&patient).into())))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    request_body = UpdatePatientReq,
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 404, description = "Unknown patient", body = ErrorRes),
        (status = 422, description = "Invalid patient data", body = ErrorRes)
    )
)]
/// Update a patient's demographic fields. Status and labor start only move
/// through the measurement and completion endpoints.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient_id = parse_patient_id(&id)?;

    let full_name = req
        .full_name
        .map(NonEmptyText::new)
        .transpose()
        .map_err(|e| error_response(PartogramError::Value(e)))?;

    let update = PatientUpdate {
        full_name,
        admission_date: req.admission_date,
        history_number: req.history_number,
        parity: req.parity,
        age: req.age,
        gestational_age: req.gestational_age,
        membrane_rupture: req.membrane_rupture,
        risk_factors: req.risk_factors,
        notes: req.notes,
    };

    let patient = state
        .labor
        .update_patient(patient_id, update)
        .map_err(error_response)?;
    Ok(Json((&patient).into()))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    )
)]
/// Delete a patient, cascading their measurement history.
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    state.labor.delete_patient(patient_id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}/timer_state",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Server-computed timer state", body = TimerStateRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    )
)]
/// Timer state for one patient, recomputed fresh on every call.
#[axum::debug_handler]
async fn timer_state(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<TimerStateRes>, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let view = state.query.timer_state(patient_id).map_err(error_response)?;
    Ok(Json((&view).into()))
}

#[utoipa::path(
    get,
    path = "/api/timer_states",
    responses(
        (status = 200, description = "Timer states for every patient", body = TimerStatesRes)
    )
)]
/// Bulk timer states for the list view. Histories are loaded in one store
/// pass and derived against a single instant.
#[axum::debug_handler]
async fn timer_states_bulk(
    State(state): State<AppState>,
) -> Result<Json<TimerStatesRes>, ApiError> {
    let views = state.query.timer_states_bulk().map_err(error_response)?;
    Ok(Json(TimerStatesRes {
        states: views.iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}/measurements",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Measurement history, most recent first", body = MeasurementsRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    )
)]
/// A patient's partogram history.
#[axum::debug_handler]
async fn list_measurements(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MeasurementsRes>, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let measurements = state
        .query
        .measurements(patient_id)
        .map_err(error_response)?;
    Ok(Json(MeasurementsRes {
        measurements: measurements.iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/patients/{id}/measurements",
    request_body = RecordMeasurementReq,
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 201, description = "Measurement recorded; fresh timer state returned", body = RecordMeasurementRes),
        (status = 404, description = "Unknown patient", body = ErrorRes),
        (status = 409, description = "Labor already completed", body = ErrorRes),
        (status = 422, description = "Invalid measurement", body = ErrorRes)
    )
)]
/// Record a partogram measurement.
///
/// The first measurement for a patient starts labor. The response carries
/// the recomputed countdown so the submitting view can reconcile without a
/// second request.
#[axum::debug_handler]
async fn record_measurement(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<RecordMeasurementReq>,
) -> Result<(StatusCode, Json<RecordMeasurementRes>), ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let draft = build_draft(req, state.clock.now()).map_err(error_response)?;

    let outcome = state
        .labor
        .record_measurement(patient_id, draft)
        .map_err(error_response)?;
    tracing::info!(
        patient_id = %patient_id,
        period = outcome.timer.period.number(),
        remaining_seconds = outcome.timer.remaining_seconds,
        "measurement recorded"
    );
    Ok((StatusCode::CREATED, Json((&outcome).into())))
}

#[utoipa::path(
    post,
    path = "/api/patients/{id}/complete_labor",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Labor completed", body = CompleteLaborRes),
        (status = 404, description = "Unknown patient", body = ErrorRes),
        (status = 409, description = "Labor has not started", body = ErrorRes)
    )
)]
/// Complete labor. Idempotent on an already-completed patient.
#[axum::debug_handler]
async fn complete_labor(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<CompleteLaborRes>, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let patient = state
        .labor
        .complete_labor(patient_id)
        .map_err(error_response)?;
    Ok(Json(CompleteLaborRes {
        success: true,
        status: patient.status.into(),
        status_color: patient.status.display_color().to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}/measurements/{measurement_id}",
    params(
        ("id" = String, Path, description = "Patient id"),
        ("measurement_id" = String, Path, description = "Measurement id")
    ),
    responses(
        (status = 204, description = "Measurement deleted"),
        (status = 404, description = "Unknown patient or measurement", body = ErrorRes)
    )
)]
/// Delete a single measurement. If it anchored the countdown, the next
/// timer query recomputes from the new latest entry automatically.
#[axum::debug_handler]
async fn delete_measurement(
    State(state): State<AppState>,
    AxumPath((id, measurement_id)): AxumPath<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let patient_id = parse_patient_id(&id)?;
    let measurement_id =
        MeasurementId::parse(&measurement_id).map_err(error_response)?;
    state
        .labor
        .delete_measurement(patient_id, measurement_id)
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use partogram_core::{BackdatePolicy, CoreConfig, ManualClock, MemoryStore};

    fn test_state() -> (AppState, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let store: Arc<dyn partogram_core::LaborStore> = Arc::new(MemoryStore::new());
        let cfg = Arc::new(
            CoreConfig::new("/partogram_data".into(), BackdatePolicy::Accept)
                .expect("config should build"),
        );
        let state = AppState {
            labor: LaborService::new(store.clone(), Arc::new(clock.clone()), cfg),
            query: TimerQueryService::new(store, Arc::new(clock.clone())),
            clock: Arc::new(clock.clone()),
        };
        (state, clock)
    }

    async fn admit(state: &AppState) -> api_shared::PatientRes {
        let (status, Json(patient)) = admit_patient(
            State(state.clone()),
            Json(AdmitPatientReq {
                full_name: "Ivanova A.P.".into(),
                admission_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                history_number: None,
                parity: None,
                age: None,
                gestational_age: None,
                membrane_rupture: None,
                risk_factors: None,
                notes: None,
            }),
        )
        .await
        .expect("admission should succeed");
        assert_eq!(status, StatusCode::CREATED);
        patient
    }

    #[tokio::test]
    async fn test_record_measurement_returns_fresh_timer() {
        let (state, _clock) = test_state();
        let patient = admit(&state).await;

        let req = RecordMeasurementReq {
            cervical_dilation: Some(8),
            ..Default::default()
        };
        let (status, Json(res)) = record_measurement(
            State(state.clone()),
            AxumPath(patient.id.clone()),
            Json(req),
        )
        .await
        .expect("record should succeed");

        assert_eq!(status, StatusCode::CREATED);
        assert!(res.labor_started);
        assert_eq!(res.period, 1);
        assert_eq!(res.interval_minutes, 30);
        assert_eq!(res.remaining_seconds, 1800);
    }

    #[tokio::test]
    async fn test_timer_state_counts_down() {
        let (state, clock) = test_state();
        let patient = admit(&state).await;
        record_measurement(
            State(state.clone()),
            AxumPath(patient.id.clone()),
            Json(RecordMeasurementReq {
                cervical_dilation: Some(8),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        clock.advance(Duration::minutes(10));
        let Json(res) = timer_state(State(state.clone()), AxumPath(patient.id.clone()))
            .await
            .expect("timer_state should succeed");
        assert_eq!(res.remaining_seconds, 20 * 60);
        assert_eq!(res.status, api_shared::LaborStatus::InProgress);
    }

    #[tokio::test]
    async fn test_out_of_range_dilation_is_422() {
        let (state, _clock) = test_state();
        let patient = admit(&state).await;

        let (status, _) = record_measurement(
            State(state.clone()),
            AxumPath(patient.id.clone()),
            Json(RecordMeasurementReq {
                cervical_dilation: Some(12),
                ..Default::default()
            }),
        )
        .await
        .expect_err("out-of-range dilation should be rejected");
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_complete_before_start_is_409() {
        let (state, _clock) = test_state();
        let patient = admit(&state).await;

        let (status, _) = complete_labor(State(state.clone()), AxumPath(patient.id.clone()))
            .await
            .expect_err("completing unstarted labor should be rejected");
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_patient_is_404() {
        let (state, _clock) = test_state();
        let missing = PatientId::new().to_string();

        let (status, _) = timer_state(State(state.clone()), AxumPath(missing))
            .await
            .expect_err("unknown patient should be rejected");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_includes_every_patient() {
        let (state, _clock) = test_state();
        let first = admit(&state).await;
        let second = admit(&state).await;

        let Json(res) = timer_states_bulk(State(state.clone()))
            .await
            .expect("bulk should succeed");
        assert_eq!(res.states.len(), 2);
        let ids: Vec<_> = res.states.iter().map(|s| s.patient_id.clone()).collect();
        assert!(ids.contains(&first.id));
        assert!(ids.contains(&second.id));
    }

    #[tokio::test]
    async fn test_status_filter_rejects_garbage() {
        let (state, _clock) = test_state();
        let result = list_patients(
            State(state.clone()),
            Query(ListPatientsQuery {
                search: None,
                status: Some("labouring".into()),
                admission_date: None,
            }),
        )
        .await;
        let (status, _) = result.expect_err("unknown status filter should be rejected");
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
