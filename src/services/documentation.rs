use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the TapBattle backend.
#[openapi(
    info(title = "TapBattle Back", description = "Quiz buzzer sessions persisted in a spreadsheet"),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::hosts::create_host,
        crate::routes::hosts::validate_host,
        crate::routes::hosts::delete_host,
        crate::routes::hosts::host_statistics,
        crate::routes::sessions::create_session,
        crate::routes::sessions::list_host_sessions,
        crate::routes::sessions::get_session,
        crate::routes::sessions::advance_round,
        crate::routes::sessions::update_mode,
        crate::routes::sessions::complete_session,
        crate::routes::sessions::delete_session,
        crate::routes::sessions::player_exists,
        crate::routes::sessions::find_player,
        crate::routes::teams::create_team,
        crate::routes::teams::validate_team,
        crate::routes::teams::list_teams,
        crate::routes::teams::delete_team,
        crate::routes::players::join_session,
        crate::routes::players::list_players,
        crate::routes::players::delete_player,
        crate::routes::taps::record_tap,
        crate::routes::taps::tap_order,
        crate::routes::taps::clear_taps,
        crate::routes::sheets::delete_rows,
        crate::routes::export::session_export,
        crate::routes::export::leaderboard_export,
        crate::routes::export::host_export,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::host::HostCredentials,
            crate::dto::host::HostSummary,
            crate::dto::host::ValidationResponse,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::AdvanceRoundRequest,
            crate::dto::session::UpdateModeRequest,
            crate::dto::session::SessionStatus,
            crate::dto::session::SessionSummary,
            crate::dto::team::CreateTeamRequest,
            crate::dto::team::CreateTeamResponse,
            crate::dto::team::ValidateTeamRequest,
            crate::dto::team::TeamSummary,
            crate::dto::player::JoinPlayerRequest,
            crate::dto::player::JoinPlayerResponse,
            crate::dto::player::TeamInfo,
            crate::dto::player::PlayerSummary,
            crate::dto::player::PlayerExistsResponse,
            crate::dto::player::PlayerLookupResponse,
            crate::dto::tap::TapRequest,
            crate::dto::tap::TapSummary,
            crate::dto::tap::TapResponse,
            crate::dto::sheets::DeleteResponse,
            crate::dto::stats::Timeframe,
            crate::dto::stats::HostStatistics,
            crate::dto::stats::StatisticsOverview,
            crate::dto::stats::SessionStatistics,
            crate::dto::stats::ActivityPoint,
            crate::dto::stats::ModeShare,
            crate::dto::stats::TopSession,
            crate::dao::models::PlayerMode,
            crate::dao::models::JoinMode,
            crate::dao::models::TeamCreator,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "hosts", description = "Host accounts"),
        (name = "sessions", description = "Session lifecycle and rounds"),
        (name = "teams", description = "Teams inside a session"),
        (name = "players", description = "Players joining a session"),
        (name = "taps", description = "Buzzer presses and their order"),
        (name = "sheets", description = "Raw spreadsheet maintenance"),
        (name = "statistics", description = "Host dashboard statistics"),
        (name = "export", description = "CSV downloads"),
    )
)]
pub struct ApiDoc;
